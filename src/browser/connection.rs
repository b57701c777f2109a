use crate::error::AppError;
use anyhow::Result;
use chromiumoxide::{Browser, Handler, Page};
use tracing::{debug, error, info};

/// 连接到已开启远程调试端口的浏览器
pub async fn connect_to_browser(port: u16) -> Result<(Browser, Handler)> {
    let browser_url = format!("http://localhost:{}", port);
    info!("正在连接到浏览器: {}", browser_url);

    let (browser, handler) = Browser::connect(&browser_url).await.map_err(|e| {
        error!("连接浏览器失败: {}", e);
        AppError::browser_connection_failed(port, e)
    })?;
    debug!("浏览器连接成功");

    Ok((browser, handler))
}

/// 优先复用 SIAK 页面，其次是第一个已有页面，都没有时新建空白页
pub async fn pick_page(browser: &Browser, host: &str) -> Result<Page> {
    let pages = browser.pages().await?;
    debug!("获取到 {} 个页面", pages.len());

    for page in pages.iter() {
        if let Ok(Some(url)) = page.url().await {
            debug!("检查页面: {}", url);
            if url.starts_with(host) {
                info!("✓ 复用已打开的页面: {}", url);
                return Ok(page.clone());
            }
        }
    }

    if let Some(page) = pages.into_iter().next() {
        return Ok(page);
    }

    debug!("创建空白页面");
    let page = browser.new_page("about:blank").await.map_err(|e| {
        error!("创建空白页面失败: {}", e);
        e
    })?;
    Ok(page)
}
