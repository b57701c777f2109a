//! 登录状态机
//!
//! 根据页面判断结果驱动登录：填写账号、处理验证码、选择角色。
//! 重试以有限循环实现，由 `SessionOptions::max_retries` 约束；
//! 拒绝 / 高负载等状态只报告失败，由外层循环决定重启或稍后再试

use crate::captcha::CaptchaSolver;
use crate::config::Config;
use crate::error::AuthFailure;
use crate::infrastructure::PortalPage;
use crate::siak::classifier::{self, AuthState};
use crate::siak::path;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// 登录流程所处阶段（日志用）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStage {
    Start,
    CheckingAuth,
    NeedsLogin,
    SubmittingCredentials,
    CaptchaRequired,
    PostLoginCheck,
    RoleSelectionNeeded,
    Authenticated,
}

impl fmt::Display for SessionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionStage::Start => "开始",
            SessionStage::CheckingAuth => "检查登录状态",
            SessionStage::NeedsLogin => "需要登录",
            SessionStage::SubmittingCredentials => "提交账号密码",
            SessionStage::CaptchaRequired => "等待验证码",
            SessionStage::PostLoginCheck => "登录后检查",
            SessionStage::RoleSelectionNeeded => "选择角色",
            SessionStage::Authenticated => "已登录",
        };
        write!(f, "{}", name)
    }
}

/// 登录成功的方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthSuccess {
    /// 会话本来就有效
    AlreadyAuthenticated,
    /// 本次完成了登录
    LoggedIn,
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// 登录尝试上限（每次提交或验证码处理都计一次）
    pub max_retries: usize,
    /// 仍停留在登录页时的退避基数，第 n 次尝试等待 n 倍
    pub login_backoff: Duration,
    /// 无头模式下无人值守，不能等待人工处理验证码
    pub headless: bool,
    /// 人工处理验证码时的轮询间隔
    pub captcha_poll_interval: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            max_retries: 5,
            login_backoff: Duration::from_secs(2),
            headless: true,
            captcha_poll_interval: Duration::from_secs(1),
        }
    }
}

impl SessionOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_retries: config.captcha_max_retries,
            login_backoff: Duration::from_secs(config.login_backoff_secs),
            headless: config.headless,
            ..Default::default()
        }
    }
}

/// SIAK 会话
///
/// 不持有页面：每次调用传入当前页面，浏览器重启后可继续使用
pub struct SiakSession {
    credentials: Credentials,
    solver: Option<Arc<dyn CaptchaSolver>>,
    options: SessionOptions,
}

impl SiakSession {
    pub fn new(
        credentials: Credentials,
        solver: Option<Arc<dyn CaptchaSolver>>,
        options: SessionOptions,
    ) -> Self {
        Self {
            credentials,
            solver,
            options,
        }
    }

    pub fn from_config(config: &Config, solver: Option<Arc<dyn CaptchaSolver>>) -> Self {
        Self::new(
            Credentials {
                username: config.username.clone(),
                password: config.password.clone(),
            },
            solver,
            SessionOptions::from_config(config),
        )
    }

    /// 确保当前页面处于已登录且已选择角色的状态
    pub async fn authenticate<P>(&self, page: &P) -> Result<AuthSuccess, AuthFailure>
    where
        P: PortalPage + ?Sized,
    {
        debug!("[登录] {}", SessionStage::Start);
        let content = page.content().await?;
        if classifier::classify(&content) == AuthState::Authenticated {
            debug!("[登录] 会话仍然有效");
            return Ok(AuthSuccess::AlreadyAuthenticated);
        }

        self.login_loop(page).await?;
        self.ensure_role_selected(page).await?;

        let content = page.content().await?;
        self.check_page(page, &content).await?;
        if !classifier::is_authenticated(&content) {
            let state = classifier::classify(&content);
            error!("[登录] 选择角色后无法确认登录状态: {}", state);
            return Err(AuthFailure::Inconclusive {
                state: state.to_string(),
            });
        }

        info!("✅ [登录] {}", SessionStage::Authenticated);
        Ok(AuthSuccess::LoggedIn)
    }

    /// 有限次数的登录尝试，成功时页面处于已登录状态（角色可能未选择）
    async fn login_loop<P>(&self, page: &P) -> Result<(), AuthFailure>
    where
        P: PortalPage + ?Sized,
    {
        let max = self.options.max_retries;
        let mut attempts = 0;

        loop {
            if attempts >= max {
                error!("❌ [登录] 已尝试 {} 次，放弃本轮登录", attempts);
                return Err(AuthFailure::MaxRetriesExceeded { attempts });
            }
            attempts += 1;

            info!("[登录 {}/{}] {}", attempts, max, SessionStage::CheckingAuth);
            if page.current_url().await? != path::AUTHENTICATION {
                page.navigate(path::AUTHENTICATION).await?;
            }

            let content = page.content().await?;
            if classifier::is_captcha_challenge(&content) {
                info!("[登录 {}/{}] {}", attempts, max, SessionStage::CaptchaRequired);
                self.handle_captcha(page).await?;
                continue;
            }
            if classifier::is_authenticated(&content) {
                return Ok(());
            }
            if !classifier::is_login_form(&content) {
                self.check_page(page, &content).await?;
                warn!(
                    "[登录 {}/{}] 页面状态不明 ({})，稍后重试",
                    attempts,
                    max,
                    classifier::classify(&content)
                );
                sleep(self.options.login_backoff).await;
                continue;
            }

            info!("[登录 {}/{}] {}", attempts, max, SessionStage::NeedsLogin);
            self.submit_credentials(page).await?;

            info!("[登录 {}/{}] {}", attempts, max, SessionStage::PostLoginCheck);
            let content = page.content().await?;
            if classifier::is_captcha_challenge(&content) {
                info!("[登录 {}/{}] {}", attempts, max, SessionStage::CaptchaRequired);
                self.handle_captcha(page).await?;
                continue;
            }
            if classifier::is_authenticated(&content) {
                return Ok(());
            }
            if classifier::is_login_form(&content) {
                let backoff = self.options.login_backoff * attempts as u32;
                warn!(
                    "[登录 {}/{}] 仍停留在登录页，{} 秒后重试",
                    attempts,
                    max,
                    backoff.as_secs()
                );
                sleep(backoff).await;
                continue;
            }

            self.check_page(page, &content).await?;
            warn!(
                "[登录 {}/{}] 提交后页面状态不明 ({})",
                attempts,
                max,
                classifier::classify(&content)
            );
            sleep(self.options.login_backoff).await;
        }
    }

    async fn submit_credentials<P>(&self, page: &P) -> Result<(), AuthFailure>
    where
        P: PortalPage + ?Sized,
    {
        debug!("[登录] {}", SessionStage::SubmittingCredentials);
        page.fill_field(path::USERNAME_INPUT, &self.credentials.username)
            .await?;
        page.fill_field(path::PASSWORD_INPUT, &self.credentials.password)
            .await?;
        page.click_and_wait(path::LOGIN_SUBMIT).await?;
        Ok(())
    }

    /// 处理验证码页面
    ///
    /// 求解器给出答案则直接提交；否则有界面时等待人工处理，
    /// 无头且没有求解器时为致命错误
    async fn handle_captcha<P>(&self, page: &P) -> Result<(), AuthFailure>
    where
        P: PortalPage + ?Sized,
    {
        if let Some(solver) = &self.solver {
            match page.captcha_image().await? {
                Some(image) => {
                    if let Some(solution) = solver.request_solution(&image).await {
                        page.fill_field(path::CAPTCHA_ANSWER_INPUT, solution.trim())
                            .await?;
                        page.click_and_wait(path::CAPTCHA_SUBMIT).await?;
                        info!("✓ 已提交验证码答案");
                        return Ok(());
                    }
                    warn!("验证码求解器没有给出答案");
                }
                None => warn!("页面上找不到验证码图片"),
            }
        }

        if !self.options.headless {
            info!("⏳ 请在浏览器窗口中完成验证码...");
            loop {
                sleep(self.options.captcha_poll_interval).await;
                let content = page.content().await?;
                if !classifier::is_captcha_challenge(&content) {
                    info!("✓ 验证码页面已通过");
                    return Ok(());
                }
            }
        }

        if self.solver.is_none() {
            error!("❌ 无头模式下遇到验证码，且未配置求解器");
            return Err(AuthFailure::CaptchaUnavailable);
        }

        warn!("验证码未解决，将在下一次尝试中重试");
        Ok(())
    }

    async fn ensure_role_selected<P>(&self, page: &P) -> Result<(), AuthFailure>
    where
        P: PortalPage + ?Sized,
    {
        let content = page.content().await?;
        if classifier::is_role_selected(&content) {
            return Ok(());
        }

        info!("[登录] {}", SessionStage::RoleSelectionNeeded);
        page.navigate(path::CHANGE_ROLE).await?;
        let content = page.content().await?;
        if !classifier::is_role_selected(&content) {
            error!("❌ 切换角色后仍未选择角色");
            return Err(AuthFailure::RoleSelectionFailed);
        }
        Ok(())
    }

    /// 拒绝需要重启会话；高负载 / 无法访问时刷新页面并报告本次失败
    async fn check_page<P>(&self, page: &P, content: &str) -> Result<(), AuthFailure>
    where
        P: PortalPage + ?Sized,
    {
        let state = classifier::classify(content);
        match state {
            AuthState::Rejected => {
                error!("❌ [登录] 请求被拒绝，需要重启会话");
                Err(AuthFailure::SessionRejected)
            }
            AuthState::HighLoad | AuthState::Inaccessible => {
                warn!("⚠️ [登录] 服务器状态: {}，刷新页面", state);
                page.reload().await?;
                Err(AuthFailure::ServerUnavailable {
                    state: state.to_string(),
                })
            }
            _ => Ok(()),
        }
    }

    /// 退出登录
    pub async fn logout<P>(&self, page: &P) -> anyhow::Result<()>
    where
        P: PortalPage + ?Sized,
    {
        page.navigate(path::LOGOUT).await?;
        info!("已退出登录");
        Ok(())
    }

    /// 打开登录页，等待用户在浏览器中手动完成登录并选择角色
    pub async fn wait_for_manual_login<P>(&self, page: &P) -> anyhow::Result<()>
    where
        P: PortalPage + ?Sized,
    {
        page.navigate(path::AUTHENTICATION).await?;
        info!("⏳ 请在浏览器中手动登录并选择角色...");

        loop {
            let content = page.content().await?;
            if classifier::classify(&content) == AuthState::Authenticated {
                info!("✓ 检测到已登录");
                return Ok(());
            }
            sleep(self.options.captcha_poll_interval).await;
        }
    }
}
