use crate::config::Config;
use crate::error::BrowserError;
use anyhow::Result;
use chromiumoxide::{Browser, BrowserConfig, Handler};
use std::path::Path;
use tracing::{debug, error, info};

/// 启动新的浏览器进程
pub async fn launch_browser(config: &Config) -> Result<(Browser, Handler)> {
    if config.headless {
        info!("🚀 启动无头浏览器...");
    } else {
        info!("🚀 启动浏览器窗口...");
    }

    let mut builder = BrowserConfig::builder();
    builder = if config.headless {
        builder.new_headless_mode()
    } else {
        builder.with_head()
    };
    if let Some(executable) = &config.browser_executable {
        debug!("浏览器路径: {}", executable);
        builder = builder.chrome_executable(Path::new(executable));
    }

    let browser_config = builder
        .args(vec![
            "--disable-gpu",
            "--no-sandbox",
            "--disable-dev-shm-usage",
        ])
        .build()
        .map_err(|message| {
            error!("配置浏览器失败: {}", message);
            BrowserError::ConfigurationFailed { message }
        })?;

    let (browser, handler) = Browser::launch(browser_config).await.map_err(|e| {
        error!("启动浏览器失败: {}", e);
        BrowserError::LaunchFailed { source: Box::new(e) }
    })?;
    debug!("浏览器启动成功");

    Ok((browser, handler))
}
