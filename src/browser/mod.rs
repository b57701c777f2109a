//! 浏览器会话
//!
//! 设置了 `BROWSER_DEBUG_PORT` 时连接已有浏览器，否则启动新进程

pub mod connection;
pub mod launch;

pub use connection::{connect_to_browser, pick_page};
pub use launch::launch_browser;

use crate::config::Config;
use crate::infrastructure::ChromiumPage;
use crate::siak::path;
use anyhow::Result;
use chromiumoxide::{Browser, Handler};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tracing::{debug, error, info, warn};

/// 浏览器及其唯一的工作页面
pub struct BrowserSession {
    browser: Browser,
    page: ChromiumPage,
    handler_task: JoinHandle<()>,
    /// 由本程序启动（关闭时需要结束进程）
    launched: bool,
}

impl BrowserSession {
    pub async fn start(config: &Config) -> Result<Self> {
        let (browser, handler, launched) = match config.browser_debug_port {
            Some(port) => {
                let (browser, handler) = connect_to_browser(port).await?;
                (browser, handler, false)
            }
            None => {
                let (browser, handler) = launch_browser(config).await?;
                (browser, handler, true)
            }
        };

        let handler_task = spawn_handler(handler);

        // 添加短暂延迟以等待浏览器状态同步
        sleep(Duration::from_millis(300)).await;

        let page = if launched {
            browser.new_page("about:blank").await?
        } else {
            pick_page(&browser, path::HOSTNAME).await?
        };
        info!("✓ 浏览器就绪");

        Ok(Self {
            browser,
            page: ChromiumPage::new(page),
            handler_task,
            launched,
        })
    }

    pub fn page(&self) -> &ChromiumPage {
        &self.page
    }

    /// 事件处理任务结束即表示与浏览器的连接已断开
    pub fn is_connected(&self) -> bool {
        !self.handler_task.is_finished()
    }

    /// 连接模式下只断开，不关闭用户的浏览器
    pub async fn close(mut self) {
        if self.launched {
            if let Err(e) = self.browser.close().await {
                warn!("关闭浏览器失败: {}", e);
            }
            if let Err(e) = self.browser.wait().await {
                warn!("等待浏览器退出失败: {}", e);
            }
        }
        self.handler_task.abort();
        debug!("浏览器会话已结束");
    }
}

/// 取得可用的浏览器会话
///
/// 会话不存在或连接已断开时重新启动；启动失败只记录日志并返回 `None`，
/// 由调用方在下一轮再试
pub async fn ensure_session<'a>(
    slot: &'a mut Option<BrowserSession>,
    config: &Config,
) -> Option<&'a BrowserSession> {
    if slot.as_ref().is_some_and(|b| !b.is_connected()) {
        warn!("⚠️ 浏览器连接已断开");
        discard_session(slot).await;
    }

    if slot.is_none() {
        info!("🔄 启动浏览器会话...");
        match BrowserSession::start(config).await {
            Ok(session) => *slot = Some(session),
            Err(e) => {
                error!("❌ 启动浏览器失败: {:#}", e);
                return None;
            }
        }
    }

    slot.as_ref()
}

/// 关闭并丢弃当前会话，下一次 `ensure_session` 会重新启动
pub async fn discard_session(slot: &mut Option<BrowserSession>) {
    if let Some(session) = slot.take() {
        session.close().await;
    }
}

/// 在后台处理浏览器事件
fn spawn_handler(mut handler: Handler) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_browser() -> Config {
        Config {
            // 没有浏览器监听的端口
            browser_debug_port: Some(1),
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_failed_start_leaves_slot_empty() {
        let config = unreachable_browser();
        let mut slot = None;

        assert!(ensure_session(&mut slot, &config).await.is_none());
        assert!(slot.is_none());
        // 下一轮仍会再次尝试，而不是返回错误
        assert!(ensure_session(&mut slot, &config).await.is_none());
    }

    #[tokio::test]
    async fn test_discard_empty_slot() {
        let mut slot: Option<BrowserSession> = None;
        discard_session(&mut slot).await;
        assert!(slot.is_none());
    }
}
