//! 从标准输入接收验证码答案
//!
//! 每行一个答案；`<请求ID> <答案>` 指定请求，否则交给当前唯一的请求

use crate::captcha::CaptchaRegistry;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing::{info, warn};

pub fn spawn_stdin_listener(registry: Arc<CaptchaRegistry>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if line.trim().is_empty() {
                continue;
            }
            if dispatch_answer(&registry, &line) {
                info!("✓ 已提交验证码答案");
            } else {
                warn!("当前没有等待中的验证码请求，输入已忽略");
            }
        }
    })
}

/// 把一行输入交给对应的请求，返回是否有请求接收
pub fn dispatch_answer(registry: &CaptchaRegistry, line: &str) -> bool {
    let line = line.trim();
    if line.is_empty() {
        return false;
    }

    if let Some((request_id, solution)) = line.split_once(char::is_whitespace) {
        if registry.is_pending(request_id) {
            return registry.resolve(request_id, solution.trim());
        }
    }
    registry.resolve_latest(line)
}
