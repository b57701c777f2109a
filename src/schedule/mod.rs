//! 课表引擎
//!
//! 页面 → `parser` → `ScheduleSnapshot` → `diff` → `Change` 列表 → `notifier`，
//! 快照通过 `codec` 在缓存文件中持久化

pub mod cache;
pub mod codec;
pub mod diff;
pub mod notifier;
pub mod parser;

pub use cache::ScheduleCache;
pub use codec::{deserialize_schedule, format_version, serialize_schedule, CACHE_FORMAT_VERSION};
pub use diff::{generate_diff, DiffOptions};
pub use notifier::{DiscordWebhookNotifier, Notifier, NotifyContext};
pub use parser::parse_schedule_html;
