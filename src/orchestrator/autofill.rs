//! 自动填写 - 编排层
//!
//! 用户手动登录后一次性填写 IRS，不做重试

use crate::browser::BrowserSession;
use crate::config::Config;
use crate::models::CourseTarget;
use crate::services::{FillOutcome, IrsService};
use crate::siak::SiakSession;
use crate::utils::wait_for_shutdown;
use anyhow::Result;
use tracing::{info, warn};

pub async fn run_autofill(
    config: &Config,
    session: &SiakSession,
    browser: BrowserSession,
    targets: &[CourseTarget],
) -> Result<()> {
    if config.headless && config.browser_debug_port.is_none() {
        warn!("⚠️ 无头模式下无法手动登录，请设置 HEADLESS=false");
    }

    let page = browser.page();
    session.wait_for_manual_login(page).await?;

    let irs = IrsService::new(false);
    match irs.fill(page, targets).await? {
        FillOutcome::RegistrationClosed => warn!("⚠️ 选课尚未开放，未填写任何课程"),
        FillOutcome::Filled(selection) => {
            info!(
                "✓ 已勾选 {}/{} 门课程",
                selection.selected.len(),
                targets.len()
            );
            irs.submit(page, config.warbot_autosubmit).await?;
        }
    }

    wait_for_shutdown().await;
    browser.close().await;
    Ok(())
}
