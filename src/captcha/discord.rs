//! 从 Discord 频道读取验证码回复
//!
//! 用机器人令牌轮询频道消息，回复（`message_reference`）所指向的消息 ID 即请求 ID

use crate::captcha::CaptchaRegistry;
use serde::Deserialize;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

const API_BASE: &str = "https://discord.com/api/v10";
const PAGE_LIMIT: &str = "50";

#[derive(Debug, Clone, Deserialize)]
pub struct DiscordMessage {
    pub id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub author: Option<DiscordAuthor>,
    #[serde(default)]
    pub message_reference: Option<MessageReference>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscordAuthor {
    #[serde(default)]
    pub bot: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageReference {
    pub message_id: Option<String>,
}

/// 频道回复轮询器
pub struct DiscordReplyListener {
    client: reqwest::Client,
    token: String,
    channel_id: String,
    registry: Arc<CaptchaRegistry>,
    poll_interval: Duration,
}

impl DiscordReplyListener {
    pub fn new(
        token: impl Into<String>,
        channel_id: impl Into<String>,
        registry: Arc<CaptchaRegistry>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            token: token.into(),
            channel_id: channel_id.into(),
            registry,
            poll_interval,
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move { self.run().await })
    }

    async fn run(self) {
        // 启动前的历史消息不处理
        let mut cursor = match self.fetch(None).await {
            Ok(messages) => newest_id(&messages),
            Err(e) => {
                warn!("⚠️ 读取 Discord 频道失败: {}", e);
                None
            }
        };
        info!("✓ Discord 回复监听已启动 (频道 {})", self.channel_id);

        loop {
            sleep(self.poll_interval).await;

            let messages = match self.fetch(cursor.as_deref()).await {
                Ok(messages) => messages,
                Err(e) => {
                    debug!("轮询 Discord 频道失败: {}", e);
                    continue;
                }
            };
            if let Some(newest) = newest_id(&messages) {
                cursor = Some(newest);
            }

            for (request_id, solution) in extract_replies(&messages) {
                if self.registry.resolve_or_hold(&request_id, solution) {
                    info!("✓ 收到 Discord 回复 (请求 {})", request_id);
                }
            }
        }
    }

    async fn fetch(&self, after: Option<&str>) -> Result<Vec<DiscordMessage>, reqwest::Error> {
        let url = format!("{}/channels/{}/messages", API_BASE, self.channel_id);
        let mut request = self
            .client
            .get(url)
            .header("Authorization", format!("Bot {}", self.token));
        request = match after {
            Some(id) => request.query(&[("after", id), ("limit", PAGE_LIMIT)]),
            None => request.query(&[("limit", "1")]),
        };
        request.send().await?.error_for_status()?.json().await
    }
}

/// 挑出非机器人发送的回复，按时间先后返回 (请求 ID, 答案)
pub fn extract_replies(messages: &[DiscordMessage]) -> Vec<(String, String)> {
    let mut ordered: Vec<&DiscordMessage> = messages.iter().collect();
    ordered.sort_by_key(|m| snowflake(&m.id));

    ordered
        .into_iter()
        .filter(|m| !m.author.as_ref().is_some_and(|a| a.bot))
        .filter_map(|m| {
            let request_id = m.message_reference.as_ref()?.message_id.clone()?;
            let solution = m.content.trim();
            (!solution.is_empty()).then(|| (request_id, solution.to_string()))
        })
        .collect()
}

fn newest_id(messages: &[DiscordMessage]) -> Option<String> {
    messages
        .iter()
        .max_by_key(|m| snowflake(&m.id))
        .map(|m| m.id.clone())
}

fn snowflake(id: &str) -> u64 {
    id.parse().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages() -> Vec<DiscordMessage> {
        serde_json::from_str(
            r#"[
                {"id": "30", "content": " k9x2 ", "author": {"bot": false},
                 "message_reference": {"message_id": "10"}},
                {"id": "25", "content": "CAPTCHA required.", "author": {"bot": true}},
                {"id": "22", "content": "hello", "author": {"bot": false}},
                {"id": "21", "content": "first", "author": {"bot": false},
                 "message_reference": {"message_id": "9"}},
                {"id": "20", "content": "  ", "author": {"bot": false},
                 "message_reference": {"message_id": "8"}}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_extract_replies_oldest_first() {
        let replies = extract_replies(&messages());
        assert_eq!(
            replies,
            vec![
                ("9".to_string(), "first".to_string()),
                ("10".to_string(), "k9x2".to_string()),
            ]
        );
    }

    #[test]
    fn test_newest_id_compares_numerically() {
        let mut list = messages();
        list.push(serde_json::from_str(r#"{"id": "100"}"#).unwrap());
        assert_eq!(newest_id(&list).as_deref(), Some("100"));
        assert_eq!(newest_id(&[]), None);
    }

    #[tokio::test]
    async fn test_reply_resolves_registered_request() {
        let registry = CaptchaRegistry::new();
        let rx = registry.register("10").unwrap();

        for (request_id, solution) in extract_replies(&messages()) {
            registry.resolve_or_hold(&request_id, solution);
        }
        assert_eq!(rx.await.unwrap(), "k9x2");
    }
}
