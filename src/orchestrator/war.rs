//! 抢课 - 编排层
//!
//! 循环：登录 → 填写 IRS → 提交；选课未开放或目标不全时退出登录，稍后重试

use crate::browser::{discard_session, ensure_session, BrowserSession};
use crate::config::Config;
use crate::error::IrsError;
use crate::infrastructure::PortalPage;
use crate::models::CourseTarget;
use crate::services::{FillOutcome, IrsService};
use crate::siak::SiakSession;
use crate::utils::logging::log_cycle_start;
use crate::utils::wait_for_shutdown;
use anyhow::Result;
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};

/// 一次抢课尝试的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarOutcome {
    /// 已填写（并按配置提交）
    Completed { selected: usize, submitted: bool },
    /// 选课尚未开放
    NotOpen,
    /// 严格模式下有目标课程未找到
    Incomplete { missing: usize },
}

impl WarOutcome {
    pub fn should_retry(&self) -> bool {
        !matches!(self, WarOutcome::Completed { .. })
    }
}

pub struct WarBot {
    targets: Vec<CourseTarget>,
    irs: IrsService,
    autosubmit: bool,
    interval: Duration,
}

impl WarBot {
    pub fn new(config: &Config, targets: Vec<CourseTarget>) -> Self {
        Self {
            targets,
            irs: IrsService::new(config.warbot_notfound_retry),
            autosubmit: config.warbot_autosubmit,
            interval: Duration::from_secs(config.warbot_interval),
        }
    }

    /// 在已登录的页面上尝试一次
    pub async fn attempt<P>(&self, page: &P) -> Result<WarOutcome>
    where
        P: PortalPage + ?Sized,
    {
        let outcome = match self.irs.fill(page, &self.targets).await {
            Ok(outcome) => outcome,
            Err(e) => {
                if let Some(IrsError::UnmatchedTargets { count, .. }) = e.downcast_ref() {
                    warn!("⚠️ 有 {} 门课程尚未出现，本轮不提交", count);
                    return Ok(WarOutcome::Incomplete { missing: *count });
                }
                return Err(e);
            }
        };

        match outcome {
            FillOutcome::RegistrationClosed => Ok(WarOutcome::NotOpen),
            FillOutcome::Filled(selection) => {
                let submitted = self.irs.submit(page, self.autosubmit).await?;
                Ok(WarOutcome::Completed {
                    selected: selection.selected.len(),
                    submitted,
                })
            }
        }
    }

    /// 抢课主循环，完成后保持浏览器打开直到 Ctrl+C
    pub async fn run(
        &self,
        config: &Config,
        session: &SiakSession,
        browser: BrowserSession,
    ) -> Result<()> {
        info!("🎯 目标课程 {} 门", self.targets.len());
        for target in &self.targets {
            info!("  - {}", target);
        }

        let mut browser = Some(browser);
        let mut cycle = 0;
        loop {
            cycle += 1;
            log_cycle_start("War", cycle);

            let Some(active) = ensure_session(&mut browser, config).await else {
                info!("⏳ {} 秒后重试", self.interval.as_secs());
                sleep(self.interval).await;
                continue;
            };

            match session.authenticate(active.page()).await {
                Ok(_) => match self.attempt(active.page()).await {
                    Ok(outcome) if !outcome.should_retry() => {
                        info!("✅ 抢课完成: {:?}", outcome);
                        wait_for_shutdown().await;
                        discard_session(&mut browser).await;
                        return Ok(());
                    }
                    Ok(outcome) => info!("本轮结果: {:?}", outcome),
                    Err(e) => error!("❌ 本轮抢课失败: {:#}", e),
                },
                Err(failure) => {
                    error!("❌ 登录失败: {}", failure);
                    if failure.needs_restart() {
                        discard_session(&mut browser).await;
                        sleep(self.interval).await;
                        continue;
                    }
                }
            }

            if let Some(active) = browser.as_ref().filter(|b| b.is_connected()) {
                if let Err(e) = session.logout(active.page()).await {
                    warn!("退出登录失败: {:#}", e);
                }
            }
            info!("⏳ {} 秒后重试", self.interval.as_secs());
            sleep(self.interval).await;
        }
    }
}
