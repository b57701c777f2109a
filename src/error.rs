use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 浏览器相关错误
    #[error("浏览器错误: {0}")]
    Browser(#[from] BrowserError),
    /// 登录流程失败
    #[error("认证错误: {0}")]
    Auth(#[from] AuthFailure),
    /// IRS 填写错误
    #[error("IRS错误: {0}")]
    Irs(#[from] IrsError),
    /// 验证码相关错误
    #[error("验证码错误: {0}")]
    Captcha(#[from] CaptchaError),
    /// 通知发送错误
    #[error("通知错误: {0}")]
    Notify(#[from] NotifyError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 浏览器相关错误
#[derive(Debug, Error)]
pub enum BrowserError {
    /// 连接浏览器失败
    #[error("无法连接到浏览器 (端口: {port}): {source}")]
    ConnectionFailed {
        port: u16,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 启动浏览器失败
    #[error("启动浏览器失败: {source}")]
    LaunchFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 浏览器配置失败
    #[error("浏览器配置失败: {message}")]
    ConfigurationFailed { message: String },
    /// 导航失败
    #[error("导航到 {url} 失败: {source}")]
    NavigationFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 页面元素不存在
    #[error("页面上找不到元素: {selector}")]
    ElementNotFound { selector: String },
}

/// 登录状态机的失败原因
///
/// 每种失败都可以被调用方区分，决定是退避、重启浏览器还是刷新页面
#[derive(Debug, Error)]
pub enum AuthFailure {
    /// 超过最大重试次数
    #[error("登录重试 {attempts} 次后仍未成功")]
    MaxRetriesExceeded { attempts: usize },
    /// 无人值守且未配置验证码求解器
    #[error("遇到验证码，但当前为无头模式且未配置验证码求解器 (请设置 AUTH_DISCORD_WEBHOOK_URL 或关闭 HEADLESS)")]
    CaptchaUnavailable,
    /// 切换角色后仍未选中角色
    #[error("无法选择账号角色，请检查账号设置")]
    RoleSelectionFailed,
    /// 请求被拒绝，需要重启浏览器会话
    #[error("请求的 URL 被拒绝，需要重启会话")]
    SessionRejected,
    /// 服务器高负载或暂时不可访问，已刷新页面
    #[error("服务器暂时不可用 ({state})，已刷新页面")]
    ServerUnavailable { state: String },
    /// 页面不符合任何已知状态
    #[error("无法判断页面状态 ({state})")]
    Inconclusive { state: String },
    /// 其他未预期错误
    #[error("登录过程中发生未预期错误: {0}")]
    UnexpectedError(#[from] anyhow::Error),
}

impl AuthFailure {
    /// 是否需要重启整个浏览器会话
    pub fn needs_restart(&self) -> bool {
        matches!(self, AuthFailure::SessionRejected)
    }
}

/// IRS 填写错误
#[derive(Debug, Error)]
pub enum IrsError {
    /// 导航后停留在了意外的页面
    #[error("期望位于 {expected}，实际为 {found}")]
    UnexpectedLocation { expected: String, found: String },
    /// 严格模式下存在未匹配的目标课程
    #[error("有 {count} 门目标课程未找到: {targets}")]
    UnmatchedTargets { count: usize, targets: String },
}

/// 验证码相关错误
#[derive(Debug, Error)]
pub enum CaptchaError {
    /// 同一会话中已有未完成的验证码请求
    #[error("已有未完成的验证码请求: {request_id}")]
    AlreadyPending { request_id: String },
    /// 验证码图片提交失败
    #[error("发送验证码图片失败: {0}")]
    Delivery(String),
}

/// 通知发送错误
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Webhook 请求失败
    #[error("Webhook 请求失败 (第 {chunk} 批): {source}")]
    RequestFailed {
        chunk: usize,
        #[source]
        source: reqwest::Error,
    },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量不存在
    #[error("环境变量 {var_name} 不存在")]
    EnvVarNotFound { var_name: String },
    /// 找不到目标课程配置
    #[error("找不到目标课程配置文件 (已尝试: {candidates})")]
    CoursesFileNotFound { candidates: String },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建浏览器连接错误
    pub fn browser_connection_failed(
        port: u16,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Browser(BrowserError::ConnectionFailed {
            port,
            source: Box::new(source),
        })
    }

    /// 创建文件读取错误
    pub fn file_read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source,
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
