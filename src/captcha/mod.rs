//! 验证码求解
//!
//! 求解器发出图片并登记请求，答案通过 `CaptchaRegistry` 以请求 ID 回传

pub mod discord;
pub mod listener;
pub mod registry;
pub mod solver;

pub use discord::DiscordReplyListener;
pub use listener::{dispatch_answer, spawn_stdin_listener};
pub use registry::CaptchaRegistry;
pub use solver::{CaptchaSolver, WebhookCaptchaSolver};
