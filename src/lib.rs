//! # Warlock
//!
//! SIAK NG（印尼大学学术门户）自动化工具：课表变化追踪、抢课、IRS 自动填写
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - `PortalPage` 语义操作，`ChromiumPage` 是唯一的 page owner
//! - `browser/` - 启动或连接浏览器，会话重启
//!
//! ### ② 核心（纯逻辑，不接触浏览器）
//! - `siak::classifier` - 根据页面文本判断状态
//! - `schedule/` - 课表解析、缓存格式、差异计算
//! - `services::course_selector` - 目标课程与 IRS 行的匹配
//!
//! ### ③ 业务能力层（Services）
//! - `siak::SiakSession` - 登录状态机
//! - `captcha/` - 验证码求解与答案回传
//! - `services::IrsService` - 填写与提交 IRS
//! - `schedule::notifier` - 变更通知
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/` - Tracker / War / AutoFill 三种循环
//!
//! ## 模块结构

pub mod browser;
pub mod captcha;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod schedule;
pub mod services;
pub mod siak;
pub mod utils;

// 重新导出常用类型
pub use browser::BrowserSession;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{ChromiumPage, PortalPage};
pub use models::{Change, CourseTarget, RowData, ScheduleSnapshot};
pub use orchestrator::{App, Mode};
pub use siak::SiakSession;
