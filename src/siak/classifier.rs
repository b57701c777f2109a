//! 页面状态判断
//!
//! 纯函数：只检查页面文本中是否包含门户固定的标记字符串，
//! 不做任何 I/O，空字符串也能安全处理

/// 已登录页面
const LOGGED_IN_MARKER: &str = "Logout Counter";
/// 尚未选择角色
const NO_ROLE_MARKER: &str = "No role selected";
/// 验证码页面
const CAPTCHA_MARKERS: [&str; 3] = [
    "This question is for testing whether you are a human visitor",
    "What code is in the image?",
    "You have entered an invalid answer",
];
/// 请求被拒绝
const REJECTED_MARKER: &str = "The requested URL was rejected";
/// 服务器高负载（"Silahkan"）
const HIGH_LOAD_MARKER: &str = "Silahkan mencoba beberapa saat lagi.";
/// 页面暂时无法访问（"Silakan"，与高负载页面仅差一个字母）
const INACCESSIBLE_MARKER: &str = "Silakan mencoba beberapa saat lagi.";
/// 登录表单的两个输入框
const LOGIN_FORM_MARKERS: [&str; 2] = [r#"name="u""#, r#"name="p""#];
/// 尚未开放选课
const REGISTRATION_CLOSED_MARKERS: [&str; 2] = [
    "periode registrasi akademik belum dimulai",
    "academic registration period has not started",
];

/// 由页面推导出的认证状态，只在当次检查中使用
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    /// 不符合任何已知状态
    LoggedOut,
    AwaitingCaptcha,
    AwaitingCredentials,
    AwaitingRoleSelection,
    Rejected,
    HighLoad,
    Inaccessible,
    Authenticated,
}

impl std::fmt::Display for AuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AuthState::LoggedOut => "未知/未登录",
            AuthState::AwaitingCaptcha => "验证码",
            AuthState::AwaitingCredentials => "登录表单",
            AuthState::AwaitingRoleSelection => "待选择角色",
            AuthState::Rejected => "请求被拒绝",
            AuthState::HighLoad => "服务器高负载",
            AuthState::Inaccessible => "暂时无法访问",
            AuthState::Authenticated => "已登录",
        };
        write!(f, "{}", name)
    }
}

pub fn is_authenticated(content: &str) -> bool {
    content.contains(LOGGED_IN_MARKER)
}

/// 页面上没有"未选择角色"提示即视为已选择
pub fn is_role_selected(content: &str) -> bool {
    !content.contains(NO_ROLE_MARKER)
}

pub fn is_captcha_challenge(content: &str) -> bool {
    CAPTCHA_MARKERS.iter().any(|m| content.contains(m))
}

pub fn is_login_form(content: &str) -> bool {
    LOGIN_FORM_MARKERS.iter().all(|m| content.contains(m))
}

pub fn is_rejected(content: &str) -> bool {
    content.contains(REJECTED_MARKER)
}

pub fn is_overloaded(content: &str) -> bool {
    content.contains(HIGH_LOAD_MARKER)
}

pub fn is_temporarily_inaccessible(content: &str) -> bool {
    content.contains(INACCESSIBLE_MARKER)
}

pub fn is_registration_closed(content: &str) -> bool {
    REGISTRATION_CLOSED_MARKERS.iter().any(|m| content.contains(m))
}

/// 综合判断页面状态
///
/// 优先级：拒绝 > 高负载 > 无法访问 > 验证码 > 已登录/待选角色 > 登录表单 > 未知。
/// 无法判断时返回 `LoggedOut`，绝不默认视为已登录
pub fn classify(content: &str) -> AuthState {
    if is_rejected(content) {
        AuthState::Rejected
    } else if is_overloaded(content) {
        AuthState::HighLoad
    } else if is_temporarily_inaccessible(content) {
        AuthState::Inaccessible
    } else if is_captcha_challenge(content) {
        AuthState::AwaitingCaptcha
    } else if is_authenticated(content) {
        if is_role_selected(content) {
            AuthState::Authenticated
        } else {
            AuthState::AwaitingRoleSelection
        }
    } else if is_login_form(content) {
        AuthState::AwaitingCredentials
    } else {
        AuthState::LoggedOut
    }
}
