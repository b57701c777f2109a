//! 验证码求解器
//!
//! 登录状态机只依赖 `CaptchaSolver`：给出图片，拿回答案或 `None`

use crate::captcha::registry::{CaptchaRegistry, PendingGuard};
use crate::error::CaptchaError;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::{error, info};

const WEBHOOK_USERNAME: &str = "Warlock Auth";
const REPLY_PROMPT: &str = "CAPTCHA required. Reply to this message with the answer.";
const TERMINAL_PROMPT: &str = "CAPTCHA required. Type the answer into the warlock terminal.";

/// 把验证码图片交给外部（人工或服务）求解
#[async_trait]
pub trait CaptchaSolver: Send + Sync {
    /// 返回答案；求解失败或请求被取消时返回 `None`
    async fn request_solution(&self, image: &[u8]) -> Option<String>;
}

/// 通过 Discord Webhook 发送验证码图片，答案经 `CaptchaRegistry` 回传
///
/// 消息 ID 即请求 ID；答案来自 `DiscordReplyListener`（已启用时）或标准输入
pub struct WebhookCaptchaSolver {
    client: reqwest::Client,
    webhook_url: String,
    mention: Option<String>,
    registry: Arc<CaptchaRegistry>,
    accepts_replies: bool,
}

impl WebhookCaptchaSolver {
    pub fn new(
        webhook_url: impl Into<String>,
        mention: Option<String>,
        registry: Arc<CaptchaRegistry>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            webhook_url: webhook_url.into(),
            mention,
            registry,
            accepts_replies: false,
        }
    }

    /// 频道回复会被读取时，提示用户直接回复消息
    pub fn accept_replies(mut self, enabled: bool) -> Self {
        self.accepts_replies = enabled;
        self
    }

    fn message_content(&self) -> String {
        let prompt = if self.accepts_replies {
            REPLY_PROMPT
        } else {
            TERMINAL_PROMPT
        };
        match &self.mention {
            Some(user_id) => format!("<@{}> {}", user_id, prompt),
            None => prompt.to_string(),
        }
    }

    /// 上传图片，返回消息 ID
    async fn post_image(&self, image: &[u8]) -> Result<String, CaptchaError> {
        let part = Part::bytes(image.to_vec())
            .file_name("captcha.png")
            .mime_str("image/png")
            .map_err(|e| CaptchaError::Delivery(e.to_string()))?;
        let form = Form::new()
            .text("username", WEBHOOK_USERNAME)
            .text("content", self.message_content())
            .part("file", part);

        let body: JsonValue = self
            .client
            .post(&self.webhook_url)
            .query(&[("wait", "true")])
            .multipart(form)
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|e| CaptchaError::Delivery(e.to_string()))?
            .json()
            .await
            .map_err(|e| CaptchaError::Delivery(e.to_string()))?;

        body.get("id")
            .and_then(JsonValue::as_str)
            .map(str::to_string)
            .ok_or_else(|| CaptchaError::Delivery("响应中缺少消息 ID".to_string()))
    }
}

#[async_trait]
impl CaptchaSolver for WebhookCaptchaSolver {
    async fn request_solution(&self, image: &[u8]) -> Option<String> {
        let request_id = match self.post_image(image).await {
            Ok(id) => id,
            Err(e) => {
                error!("❌ {}", e);
                return None;
            }
        };

        let rx = match self.registry.register(request_id.as_str()) {
            Ok(rx) => rx,
            Err(e) => {
                error!("❌ {}", e);
                return None;
            }
        };
        let _guard = PendingGuard::new(&self.registry, request_id.as_str());

        info!("⏳ 验证码已发送 (请求 {})，等待答案...", request_id);
        let solution = rx.await.ok()?;
        info!("✓ 收到验证码答案 (请求 {})", request_id);
        Some(solution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_matches_answer_channel() {
        let registry = Arc::new(CaptchaRegistry::new());
        let solver = WebhookCaptchaSolver::new("http://localhost/hook", None, registry.clone());
        assert_eq!(solver.message_content(), TERMINAL_PROMPT);

        let solver = WebhookCaptchaSolver::new("http://localhost/hook", Some("42".into()), registry)
            .accept_replies(true);
        assert_eq!(solver.message_content(), format!("<@42> {}", REPLY_PROMPT));
    }
}
