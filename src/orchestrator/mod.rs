//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 把登录状态机、课表引擎和 IRS 服务组合成长时间运行的循环。
//! 只有编排层持有 `BrowserSession`，同一时间只有一个循环在使用页面。
//!
//! ## 模块划分
//!
//! - `tracker` - 定时检查课表变化并通知
//! - `war` - 抢课：循环填写并提交 IRS
//! - `autofill` - 手动登录后一次性填写 IRS
//!
//! ## 层次关系
//!
//! ```text
//! App (选择模式、创建浏览器与会话)
//!     ↓
//! tracker / war / autofill
//!     ↓
//! siak::SiakSession · schedule · services::IrsService
//!     ↓
//! infrastructure (PortalPage / ChromiumPage)
//! ```

pub mod autofill;
pub mod tracker;
pub mod war;

pub use autofill::run_autofill;
pub use tracker::{run_tracker, CycleOutcome, ScheduleTracker};
pub use war::{WarBot, WarOutcome};

use crate::browser::BrowserSession;
use crate::captcha::{
    spawn_stdin_listener, CaptchaRegistry, CaptchaSolver, DiscordReplyListener,
    WebhookCaptchaSolver,
};
use crate::config::Config;
use crate::models::{load_course_targets, CourseTarget};
use crate::siak::SiakSession;
use crate::utils::logging::log_startup;
use anyhow::{bail, Result};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::time::Duration;
use tracing::{info, warn};

/// 运行模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Track,
    War,
    Autofill,
}

impl FromStr for Mode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "track" | "tracker" => Ok(Mode::Track),
            "war" | "warbot" => Ok(Mode::War),
            "autofill" => Ok(Mode::Autofill),
            other => bail!("未知模式: {} (可选: track / war / autofill)", other),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Track => "Tracker",
            Mode::War => "War",
            Mode::Autofill => "AutoFill",
        };
        write!(f, "{}", name)
    }
}

/// 应用主结构
pub struct App {
    config: Config,
    mode: Mode,
    registry: Arc<CaptchaRegistry>,
}

impl App {
    pub fn new(config: Config, mode: Mode) -> Self {
        Self {
            config,
            mode,
            registry: Arc::new(CaptchaRegistry::new()),
        }
    }

    /// 运行应用主逻辑
    pub async fn run(self) -> Result<()> {
        log_startup(&self.mode.to_string(), &self.config);

        // 手动登录模式不需要账号
        if self.mode != Mode::Autofill {
            self.config.validate()?;
        }

        // 先加载目标课程，文件缺失时在启动浏览器前失败
        let targets = match self.mode {
            Mode::Track => Vec::new(),
            Mode::War | Mode::Autofill => self.load_targets().await?,
        };

        let session = SiakSession::from_config(&self.config, self.build_solver());
        let browser = BrowserSession::start(&self.config).await?;

        match self.mode {
            Mode::Track => run_tracker(&self.config, &session, browser).await,
            Mode::War => {
                WarBot::new(&self.config, targets)
                    .run(&self.config, &session, browser)
                    .await
            }
            Mode::Autofill => run_autofill(&self.config, &session, browser, &targets).await,
        }
    }

    async fn load_targets(&self) -> Result<Vec<CourseTarget>> {
        let path = self.config.resolve_courses_file()?;
        let targets = load_course_targets(&path).await?;
        if targets.is_empty() {
            warn!("⚠️ 目标课程列表为空");
        }
        Ok(targets)
    }

    /// 配置了验证码 Webhook 时创建求解器
    ///
    /// 答案总能从标准输入提交；配置了机器人令牌与频道时还会读取频道回复
    fn build_solver(&self) -> Option<Arc<dyn CaptchaSolver>> {
        let webhook = self.config.auth_discord_webhook_url.clone()?;
        spawn_stdin_listener(self.registry.clone());

        let accepts_replies = match self.config.discord_reply_channel() {
            Some((token, channel_id)) => {
                DiscordReplyListener::new(
                    token,
                    channel_id,
                    self.registry.clone(),
                    Duration::from_secs(self.config.discord_poll_interval),
                )
                .spawn();
                info!("✓ 验证码求解器已启用，可回复 Discord 消息或在终端输入答案");
                true
            }
            None => {
                warn!("⚠️ 未设置 DISCORD_TOKEN / DISCORD_CHANNEL_ID，只能在终端输入验证码答案");
                false
            }
        };

        Some(Arc::new(
            WebhookCaptchaSolver::new(webhook, self.config.user_id.clone(), self.registry.clone())
                .accept_replies(accepts_replies),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parsing() {
        assert_eq!("track".parse::<Mode>().unwrap(), Mode::Track);
        assert_eq!(" WAR ".parse::<Mode>().unwrap(), Mode::War);
        assert_eq!("autofill".parse::<Mode>().unwrap(), Mode::Autofill);
        assert!("tracker2".parse::<Mode>().is_err());
    }
}
