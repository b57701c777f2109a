//! SIAK NG 地址与页面选择器常量

pub const HOSTNAME: &str = "https://academic.ui.ac.id/";
pub const AUTHENTICATION: &str = "https://academic.ui.ac.id/main/Authentication";
pub const LOGOUT: &str = "https://academic.ui.ac.id/main/Authentication/Logout";
pub const CHANGE_ROLE: &str = "https://academic.ui.ac.id/main/Authentication/ChangeRole";
pub const WELCOME: &str = "https://academic.ui.ac.id/main/Welcome";
pub const COURSE_PLAN_EDIT: &str = "https://academic.ui.ac.id/main/CoursePlan/CoursePlanEdit";

/// 登录表单
pub const USERNAME_INPUT: &str = "input[name=u]";
pub const PASSWORD_INPUT: &str = "input[name=p]";
pub const LOGIN_SUBMIT: &str = "input[type=submit]";

/// 验证码页面
pub const CAPTCHA_IMAGE: &str = r#"img[src*="data:image/png;base64,"]"#;
pub const CAPTCHA_ANSWER_INPUT: &str = "input[name=answer]";
pub const CAPTCHA_SUBMIT: &str = "button#jar";

/// IRS 表单
pub const IRS_SUBMIT: &str = "input[type=submit][value='Simpan IRS']";
