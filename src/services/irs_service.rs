//! IRS（选课表）填写 - 能力层
//!
//! 打开 IRS 编辑页，勾选匹配的课程，按需提交

use crate::error::IrsError;
use crate::infrastructure::PortalPage;
use crate::models::CourseTarget;
use crate::services::course_selector::{select_matches, Selection};
use crate::siak::{classifier, path};
use anyhow::{Context, Result};
use tracing::{error, info, warn};

/// 一次填写的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FillOutcome {
    /// 已勾选（未提交）
    Filled(Selection),
    /// 选课尚未开放
    RegistrationClosed,
}

/// IRS 填写服务
pub struct IrsService {
    /// 存在未匹配目标时直接失败
    strict: bool,
}

impl IrsService {
    pub fn new(strict: bool) -> Self {
        Self { strict }
    }

    /// 打开 IRS 页面并勾选所有匹配的课程
    pub async fn fill<P>(&self, page: &P, targets: &[CourseTarget]) -> Result<FillOutcome>
    where
        P: PortalPage + ?Sized,
    {
        page.navigate(path::COURSE_PLAN_EDIT)
            .await
            .context("无法打开 IRS 页面")?;

        let found = page.current_url().await?;
        if found != path::COURSE_PLAN_EDIT {
            return Err(IrsError::UnexpectedLocation {
                expected: path::COURSE_PLAN_EDIT.to_string(),
                found,
            }
            .into());
        }

        let content = page.content().await?;
        if classifier::is_registration_closed(&content) {
            warn!("⚠️ 选课尚未开放");
            return Ok(FillOutcome::RegistrationClosed);
        }

        let rows = page.query_rows().await.context("读取 IRS 表格失败")?;
        info!("IRS 表格共 {} 行可选课程", rows.len());

        let selection = select_matches(&rows, targets);
        for (target, row) in &selection.selected {
            page.check_radio(&row.code).await?;
            info!("✓ 已勾选 {} ({}) ← {}", row.display_name, row.code, target);
        }

        if !selection.is_complete() {
            for target in &selection.unmatched {
                error!("❌ 未找到课程: {}", target);
            }
            if self.strict {
                return Err(IrsError::UnmatchedTargets {
                    count: selection.unmatched.len(),
                    targets: describe(&selection.unmatched),
                }
                .into());
            }
        }

        info!(
            "IRS 填写完成: 勾选 {}/{}",
            selection.selected.len(),
            targets.len()
        );
        Ok(FillOutcome::Filled(selection))
    }

    /// 滚动到底部并点击"Simpan IRS"；`autosubmit` 为假时只提示用户手动提交
    pub async fn submit<P>(&self, page: &P, autosubmit: bool) -> Result<bool>
    where
        P: PortalPage + ?Sized,
    {
        page.scroll_to_bottom().await?;
        if !autosubmit {
            info!("💡 已填写完毕，请检查后在浏览器中手动提交 IRS");
            return Ok(false);
        }

        page.click_and_wait(path::IRS_SUBMIT).await?;
        info!("✅ IRS 已提交");
        Ok(true)
    }
}

fn describe(targets: &[CourseTarget]) -> String {
    targets
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
