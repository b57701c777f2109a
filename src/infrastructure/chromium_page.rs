//! chromiumoxide 页面实现 - 基础设施层
//!
//! 持有唯一的 page 资源，通过执行 JS 与 CDP 命令实现 `PortalPage`

use crate::error::BrowserError;
use crate::infrastructure::PortalPage;
use crate::models::RowData;
use crate::siak::path;
use anyhow::Result;
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tracing::debug;

/// IRS 表格行提取脚本，四个字段缺一不可
const QUERY_ROWS_JS: &str = r#"
(() => Array.from(document.querySelectorAll('tr'))
    .map(row => {
        const label = row.querySelector('label');
        const prof = row.querySelector('td:nth-child(9)');
        const time = row.querySelector('td:nth-child(7)');
        const radio = row.querySelector('input[type="radio"]');
        if (!label || !prof || !time || !radio) return null;
        return {
            name: label.innerText.trim(),
            prof: prof.innerText.trim(),
            time: time.innerText.trim(),
            code: radio.value,
        };
    })
    .filter(row => row !== null))()
"#;

/// 基于 chromiumoxide 的页面
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 暴露 eval() 能力
/// - 不认识课表 / IRS 业务流程
pub struct ChromiumPage {
    page: Page,
}

impl ChromiumPage {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> Result<JsonValue> {
        let result = self.page.evaluate(js_code.into()).await?;
        let json_value = result.into_value()?;
        Ok(json_value)
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> Result<T> {
        let json_value = self.eval(js_code).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }

    /// 执行返回布尔值的元素操作脚本，`false` 表示元素不存在
    async fn eval_on_element(&self, selector: &str, js_code: String) -> Result<()> {
        if self.eval_as::<bool>(js_code).await? {
            Ok(())
        } else {
            Err(BrowserError::ElementNotFound {
                selector: selector.to_string(),
            }
            .into())
        }
    }
}

#[async_trait]
impl PortalPage for ChromiumPage {
    async fn current_url(&self) -> Result<String> {
        Ok(self.page.url().await?.unwrap_or_default())
    }

    async fn content(&self) -> Result<String> {
        Ok(self.page.content().await?)
    }

    async fn navigate(&self, url: &str) -> Result<()> {
        debug!("导航到: {}", url);
        self.page
            .goto(url)
            .await
            .map_err(|e| BrowserError::NavigationFailed {
                url: url.to_string(),
                source: Box::new(e),
            })?;
        Ok(())
    }

    async fn reload(&self) -> Result<()> {
        debug!("刷新页面");
        self.page.reload().await?;
        Ok(())
    }

    async fn fill_field(&self, selector: &str, value: &str) -> Result<()> {
        let js = format!(
            r#"(() => {{
                const el = document.querySelector({selector});
                if (!el) return false;
                el.value = {value};
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                return true;
            }})()"#,
            selector = serde_json::to_string(selector)?,
            value = serde_json::to_string(value)?,
        );
        self.eval_on_element(selector, js).await
    }

    async fn click_and_wait(&self, selector: &str) -> Result<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| BrowserError::ElementNotFound {
                selector: selector.to_string(),
            })?;
        element.click().await?;
        self.page.wait_for_navigation().await?;
        Ok(())
    }

    async fn captcha_image(&self) -> Result<Option<Vec<u8>>> {
        let Ok(element) = self.page.find_element(path::CAPTCHA_IMAGE).await else {
            return Ok(None);
        };
        let image = element.screenshot(CaptureScreenshotFormat::Png).await?;
        debug!("验证码图片: {} 字节", image.len());
        Ok(Some(image))
    }

    async fn query_rows(&self) -> Result<Vec<RowData>> {
        self.eval_as(QUERY_ROWS_JS).await
    }

    async fn check_radio(&self, value: &str) -> Result<()> {
        let js = format!(
            r#"(() => {{
                const value = {value};
                const radio = Array.from(document.querySelectorAll('input[type="radio"]'))
                    .find(r => r.value === value);
                if (!radio) return false;
                radio.click();
                return true;
            }})()"#,
            value = serde_json::to_string(value)?,
        );
        self.eval_on_element(&format!("input[type=radio][value={}]", value), js)
            .await
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        self.eval("window.scrollTo(0, document.body.scrollHeight); true")
            .await?;
        Ok(())
    }
}
