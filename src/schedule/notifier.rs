//! 课表变更通知
//!
//! 核心只负责产出 `Change`；本模块把它们转换成 Discord Webhook 消息并发送

use crate::error::NotifyError;
use crate::models::{Change, ChangeKind};
use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};
use tracing::{debug, info, warn};

/// Discord 单条消息最多 10 个 embed
const MAX_EMBEDS_PER_MESSAGE: usize = 10;
const WEBHOOK_USERNAME: &str = "Warlock Tracker";
const WEBHOOK_AVATAR: &str = "https://academic.ui.ac.id/favicon.ico";

/// 通知上下文
#[derive(Debug, Clone)]
pub struct NotifyContext {
    /// 被追踪的课表地址（用于提取学期）
    pub tracked_url: String,
    /// 检查间隔（秒）
    pub interval_secs: u64,
}

/// 通知发送方
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, changes: &[Change], ctx: &NotifyContext) -> Result<(), NotifyError>;
}

/// Discord Webhook 通知
pub struct DiscordWebhookNotifier {
    client: reqwest::Client,
    webhook_url: String,
}

impl DiscordWebhookNotifier {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            webhook_url: webhook_url.into(),
        }
    }
}

#[async_trait]
impl Notifier for DiscordWebhookNotifier {
    async fn notify(&self, changes: &[Change], ctx: &NotifyContext) -> Result<(), NotifyError> {
        let payloads = build_payloads(changes, ctx, chrono::Utc::now().timestamp());
        if payloads.is_empty() {
            warn!("没有需要发送的变更");
            return Ok(());
        }

        let total = payloads.len();
        for (i, payload) in payloads.iter().enumerate() {
            debug!("发送第 {}/{} 批通知", i + 1, total);
            self.client
                .post(&self.webhook_url)
                .query(&[("wait", "true")])
                .json(payload)
                .send()
                .await
                .and_then(|resp| resp.error_for_status())
                .map_err(|source| NotifyError::RequestFailed { chunk: i + 1, source })?;
            info!("✓ 已发送第 {}/{} 批通知", i + 1, total);
        }

        info!("✅ 课表变更已发送到 Webhook");
        Ok(())
    }
}

/// 构造所有 Webhook 消息体，标题只出现在第一条
pub fn build_payloads(changes: &[Change], ctx: &NotifyContext, now: i64) -> Vec<JsonValue> {
    let period = format_period(&extract_period(&ctx.tracked_url));
    let since = now - ctx.interval_secs as i64;
    let header = format!(
        "## Jadwal SIAK UI Berubah ({})\n\nBetween <t:{}:R> to <t:{}:R>",
        period, since, now
    );

    let embeds: Vec<JsonValue> = changes.iter().map(embed_for).collect();

    embeds
        .chunks(MAX_EMBEDS_PER_MESSAGE)
        .enumerate()
        .map(|(i, chunk)| {
            let mut payload = json!({
                "username": WEBHOOK_USERNAME,
                "avatar_url": WEBHOOK_AVATAR,
                "embeds": chunk,
            });
            if i == 0 {
                payload["content"] = json!(header);
            }
            payload
        })
        .collect()
}

fn embed_for(change: &Change) -> JsonValue {
    let (label, color) = match change.kind {
        ChangeKind::New => ("[NEW]", 0x57F287),
        ChangeKind::Removed => ("[REMOVED]", 0xED4245),
        ChangeKind::Modified => ("[EDITED]", 0xFEE75C),
    };

    let fields: Vec<JsonValue> = change
        .fields
        .iter()
        .map(|f| json!({ "name": f.name, "value": f.value, "inline": f.emphasized }))
        .collect();

    json!({
        "title": format!("{} {}", label, change.title),
        "color": color,
        "fields": fields,
    })
}

/// 从地址中提取学期代码，例如 `...?period=2025-2` → `2025-2`
pub fn extract_period(url: &str) -> String {
    url.split_once("period=")
        .map(|(_, rest)| rest.split(['&', '#']).next().unwrap_or_default())
        .filter(|period| !period.is_empty())
        .unwrap_or("Unknown")
        .to_string()
}

/// `2025-2` → `Semester Genap 2025/2026`
pub fn format_period(period_code: &str) -> String {
    let Some((year, semester)) = period_code.split_once('-') else {
        return period_code.to_string();
    };
    let Ok(year_num) = year.parse::<i32>() else {
        return period_code.to_string();
    };

    let semester_name = if semester == "1" { "Ganjil" } else { "Genap" };
    format!("Semester {} {}/{}", semester_name, year, year_num + 1)
}
