//! 课表追踪 - 编排层
//!
//! 每隔 `TRACKER_INTERVAL` 秒：登录 → 打开课表页 → 解析 → 与缓存比较 → 通知 → 更新缓存

use crate::browser::{discard_session, ensure_session, BrowserSession};
use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::PortalPage;
use crate::schedule::{
    deserialize_schedule, format_version, generate_diff, parse_schedule_html, serialize_schedule,
    DiffOptions, DiscordWebhookNotifier, Notifier, NotifyContext, ScheduleCache,
    CACHE_FORMAT_VERSION,
};
use crate::siak::{classifier, SiakSession};
use crate::utils::logging::{log_cycle_start, truncate_text};
use anyhow::{anyhow, Context, Result};
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{debug, error, info, warn};

/// 一轮检查的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// 首次运行，只写入缓存
    Seeded { courses: usize },
    /// 与缓存完全一致
    Unchanged,
    /// 文本不同但没有需要通知的变化（顺序变化或全部被抑制）
    NoReportableChange,
    Notified { changes: usize },
    /// 通知发送失败，缓存仍已更新
    NotifyFailed { changes: usize },
    /// 页面状态不适合比较，本轮跳过
    Skipped(String),
}

/// 课表追踪器，持有上一轮的缓存文本
pub struct ScheduleTracker {
    cache: ScheduleCache,
    notifier: Arc<dyn Notifier>,
    options: DiffOptions,
    context: NotifyContext,
    previous: Option<String>,
}

impl ScheduleTracker {
    pub fn new(
        cache: ScheduleCache,
        notifier: Arc<dyn Notifier>,
        options: DiffOptions,
        context: NotifyContext,
    ) -> Self {
        Self {
            cache,
            notifier,
            options,
            context,
            previous: None,
        }
    }

    /// 按配置创建，并读取已有缓存
    pub async fn from_config(config: &Config, notifier: Arc<dyn Notifier>) -> AppResult<Self> {
        let mut tracker = Self::new(
            ScheduleCache::new(&config.cache_file),
            notifier,
            DiffOptions {
                suppress_professor_only: config.tracker_suppress_professor_change,
                suppress_location_only: config.tracker_suppress_location_change,
            },
            NotifyContext {
                tracked_url: config.tracked_url.clone(),
                interval_secs: config.tracker_interval,
            },
        );
        tracker.load_cache().await?;
        Ok(tracker)
    }

    pub async fn load_cache(&mut self) -> AppResult<()> {
        self.previous = self.cache.load().await?;
        match &self.previous {
            Some(_) => info!("✓ 已读取课表缓存: {}", self.cache.path().display()),
            None => info!("未找到课表缓存，首轮检查将只建立缓存"),
        }
        Ok(())
    }

    /// 打开课表页并处理一轮
    pub async fn run_cycle<P>(&mut self, page: &P) -> Result<CycleOutcome>
    where
        P: PortalPage + ?Sized,
    {
        let url = self.context.tracked_url.clone();
        page.navigate(&url)
            .await
            .with_context(|| format!("无法打开课表页: {}", url))?;

        let current_url = page.current_url().await?;
        if current_url != url {
            warn!("页面被重定向到 {}", current_url);
            return Ok(CycleOutcome::Skipped(format!("重定向到 {}", current_url)));
        }

        let content = page.content().await?;
        let state = classifier::classify(&content);
        if classifier::is_captcha_challenge(&content) || !classifier::is_authenticated(&content) {
            warn!("课表页状态异常: {}", state);
            debug!("页面内容: {}", truncate_text(&content, 200));
            return Ok(CycleOutcome::Skipped(state.to_string()));
        }

        self.process_markup(&content).await
    }

    /// 解析课表并与上一轮比较
    pub async fn process_markup(&mut self, markup: &str) -> Result<CycleOutcome> {
        let current = parse_schedule_html(markup).context("解析课表失败")?;
        let current_text = serialize_schedule(&current);

        let previous_text = match self.previous.as_deref() {
            Some(text) if format_version(text) != Some(CACHE_FORMAT_VERSION) => {
                warn!("⚠️ 缓存格式版本不兼容，重新建立缓存");
                self.commit(current_text).await?;
                return Ok(CycleOutcome::Seeded {
                    courses: current.len(),
                });
            }
            Some(text) if !text.trim().is_empty() => text.to_string(),
            _ => {
                self.commit(current_text).await?;
                info!("✓ 已建立课表缓存 ({} 门课程)", current.len());
                return Ok(CycleOutcome::Seeded {
                    courses: current.len(),
                });
            }
        };

        if previous_text == current_text {
            info!("课表没有变化");
            return Ok(CycleOutcome::Unchanged);
        }

        if current.is_empty() {
            warn!("课表页没有解析到任何课程，保留旧缓存");
            return Ok(CycleOutcome::Skipped("课表为空".to_string()));
        }

        let previous = deserialize_schedule(&previous_text);
        let changes = generate_diff(&previous, &current, self.options);

        let outcome = if changes.is_empty() {
            info!("课表文本有变化，但没有需要通知的变更");
            CycleOutcome::NoReportableChange
        } else {
            info!("📢 检测到 {} 项课表变更", changes.len());
            match self.notifier.notify(&changes, &self.context).await {
                Ok(()) => CycleOutcome::Notified {
                    changes: changes.len(),
                },
                Err(e) => {
                    error!("❌ 发送通知失败: {}", e);
                    CycleOutcome::NotifyFailed {
                        changes: changes.len(),
                    }
                }
            }
        };

        self.commit(current_text).await?;
        Ok(outcome)
    }

    async fn commit(&mut self, text: String) -> AppResult<()> {
        self.cache.store(&text).await?;
        self.previous = Some(text);
        Ok(())
    }
}

/// 追踪模式主循环，直到进程结束
pub async fn run_tracker(
    config: &Config,
    session: &SiakSession,
    browser: BrowserSession,
) -> Result<()> {
    config.validate_tracker()?;
    let webhook = config
        .tracker_discord_webhook_url
        .clone()
        .ok_or_else(|| anyhow!("未设置 TRACKER_DISCORD_WEBHOOK_URL"))?;
    let notifier: Arc<dyn Notifier> = Arc::new(DiscordWebhookNotifier::new(webhook));
    let mut tracker = ScheduleTracker::from_config(config, notifier).await?;
    let interval = Duration::from_secs(config.tracker_interval);
    let mut browser = Some(browser);

    let mut cycle = 0;
    loop {
        cycle += 1;
        log_cycle_start("Tracker", cycle);

        if let Some(active) = ensure_session(&mut browser, config).await {
            match session.authenticate(active.page()).await {
                Ok(_) => match tracker.run_cycle(active.page()).await {
                    Ok(outcome) => info!("本轮结果: {:?}", outcome),
                    Err(e) => error!("❌ 本轮检查失败: {:#}", e),
                },
                Err(failure) => {
                    error!("❌ 登录失败: {}", failure);
                    if failure.needs_restart() {
                        discard_session(&mut browser).await;
                    }
                }
            }
        }

        info!("⏳ {} 秒后进行下一轮检查", interval.as_secs());
        sleep(interval).await;
    }
}
