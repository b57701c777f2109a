//! 门户页面能力 - 基础设施层
//!
//! 登录状态机、课表追踪和 IRS 填写只依赖这些语义操作，
//! 不关心底层使用哪个浏览器自动化库

use crate::models::RowData;
use anyhow::Result;
use async_trait::async_trait;

/// 单个浏览器页面
///
/// 同一时间只由一个编排器独占使用，所有操作顺序执行
#[async_trait]
pub trait PortalPage: Send + Sync {
    /// 当前地址
    async fn current_url(&self) -> Result<String>;

    /// 当前页面 HTML
    async fn content(&self) -> Result<String>;

    /// 导航并等待加载完成
    async fn navigate(&self, url: &str) -> Result<()>;

    /// 刷新当前页面
    async fn reload(&self) -> Result<()>;

    /// 填写输入框
    async fn fill_field(&self, selector: &str, value: &str) -> Result<()>;

    /// 点击元素并等待随之而来的页面加载
    async fn click_and_wait(&self, selector: &str) -> Result<()>;

    /// 验证码图片（PNG），页面上没有验证码图片时返回 `None`
    async fn captcha_image(&self) -> Result<Option<Vec<u8>>>;

    /// 读取 IRS 表格中所有完整的课程行（按文档顺序）
    async fn query_rows(&self) -> Result<Vec<RowData>>;

    /// 勾选 value 为指定值的单选框
    async fn check_radio(&self, value: &str) -> Result<()>;

    /// 滚动到页面底部
    async fn scroll_to_bottom(&self) -> Result<()>;
}
