//! 测试用的门户模拟页面
#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use warlock::captcha::CaptchaSolver;
use warlock::infrastructure::PortalPage;
use warlock::models::RowData;
use warlock::siak::path;

pub const LOGIN_PAGE: &str = r#"<form><input name="u"><input name="p" type="password"><input type="submit"></form>"#;
pub const CAPTCHA_PAGE: &str = r#"What code is in the image? <img src="data:image/png;base64,AAAA"><input name="answer"><button id="jar">"#;
pub const PASSWORD: &str = "secret";

#[derive(Default)]
pub struct PortalState {
    pub url: String,
    pub logged_in: bool,
    pub role_selected: bool,
    /// 打开角色页面后即选中角色
    pub role_page_selects: bool,
    /// 接下来几次打开登录页会出现验证码
    pub captcha_on_login: usize,
    pub captcha_showing: bool,
    pub captcha_answer: String,
    /// 人工模式：读取几次页面后验证码自动消失
    pub captcha_clears_after_reads: Option<usize>,
    /// 覆盖所有页面内容（拒绝、高负载等）
    pub forced_page: Option<String>,
    /// 打开 IRS 页面时跳转到其他地址
    pub irs_redirect: Option<String>,
    pub irs_closed: bool,
    pub rows: Vec<RowData>,
    pub schedule_url: String,
    pub schedule_html: String,

    pub fields: HashMap<String, String>,
    pub clicks: Vec<String>,
    pub navigations: Vec<String>,
    pub checked: Vec<String>,
    pub reloads: usize,
}

#[derive(Default)]
pub struct FakePortal {
    state: Mutex<PortalState>,
}

impl FakePortal {
    pub fn new(state: PortalState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    pub fn logged_in() -> Self {
        Self::new(PortalState {
            url: path::WELCOME.to_string(),
            logged_in: true,
            role_selected: true,
            ..Default::default()
        })
    }

    pub fn logged_out() -> Self {
        Self::new(PortalState {
            url: "about:blank".to_string(),
            role_selected: true,
            ..Default::default()
        })
    }

    pub fn state(&self) -> MutexGuard<'_, PortalState> {
        self.state.lock().unwrap()
    }
}

fn welcome(state: &PortalState) -> String {
    let role = if state.role_selected {
        "Role: Mahasiswa"
    } else {
        "No role selected"
    };
    format!("<div>Logout Counter</div><p>{}</p>", role)
}

fn irs_page(state: &PortalState) -> String {
    if state.irs_closed {
        format!(
            "{}<p>Anda tidak dapat mengisi IRS karena periode registrasi akademik belum dimulai</p>",
            welcome(state)
        )
    } else {
        format!("{}<form>IRS</form>", welcome(state))
    }
}

#[async_trait]
impl PortalPage for FakePortal {
    async fn current_url(&self) -> Result<String> {
        Ok(self.state().url.clone())
    }

    async fn content(&self) -> Result<String> {
        let mut state = self.state();
        if let Some(page) = &state.forced_page {
            return Ok(page.clone());
        }
        if state.captcha_showing {
            if let Some(reads) = state.captcha_clears_after_reads {
                if reads == 0 {
                    state.captcha_showing = false;
                    state.logged_in = true;
                } else {
                    state.captcha_clears_after_reads = Some(reads - 1);
                }
            }
        }
        if state.captcha_showing {
            return Ok(CAPTCHA_PAGE.to_string());
        }
        if !state.logged_in {
            return Ok(if state.url == path::AUTHENTICATION {
                LOGIN_PAGE.to_string()
            } else {
                "<html></html>".to_string()
            });
        }
        let url = state.url.clone();
        if url == path::COURSE_PLAN_EDIT {
            Ok(irs_page(&state))
        } else if !state.schedule_url.is_empty() && url == state.schedule_url {
            Ok(format!("{}{}", welcome(&state), state.schedule_html))
        } else {
            Ok(welcome(&state))
        }
    }

    async fn navigate(&self, url: &str) -> Result<()> {
        let mut state = self.state();
        state.navigations.push(url.to_string());

        if url == path::LOGOUT {
            state.logged_in = false;
            state.url = path::AUTHENTICATION.to_string();
            return Ok(());
        }
        if url == path::AUTHENTICATION && !state.logged_in && state.captcha_on_login > 0 {
            state.captcha_on_login -= 1;
            state.captcha_showing = true;
        }
        if url == path::CHANGE_ROLE && state.role_page_selects {
            state.role_selected = true;
        }
        if url == path::COURSE_PLAN_EDIT {
            if let Some(target) = state.irs_redirect.clone() {
                state.url = target;
                return Ok(());
            }
        }
        state.url = url.to_string();
        Ok(())
    }

    async fn reload(&self) -> Result<()> {
        self.state().reloads += 1;
        Ok(())
    }

    async fn fill_field(&self, selector: &str, value: &str) -> Result<()> {
        self.state()
            .fields
            .insert(selector.to_string(), value.to_string());
        Ok(())
    }

    async fn click_and_wait(&self, selector: &str) -> Result<()> {
        let mut state = self.state();
        state.clicks.push(selector.to_string());

        if selector == path::CAPTCHA_SUBMIT {
            let answer = state.fields.get(path::CAPTCHA_ANSWER_INPUT).cloned();
            if answer.as_deref() == Some(state.captcha_answer.as_str()) {
                state.captcha_showing = false;
            }
        } else if selector == path::LOGIN_SUBMIT {
            let password = state.fields.get(path::PASSWORD_INPUT).cloned();
            if password.as_deref() == Some(PASSWORD) {
                state.logged_in = true;
                state.url = path::WELCOME.to_string();
            }
        }
        Ok(())
    }

    async fn captcha_image(&self) -> Result<Option<Vec<u8>>> {
        let state = self.state();
        Ok(state.captcha_showing.then(|| vec![0x89, 0x50, 0x4e, 0x47]))
    }

    async fn query_rows(&self) -> Result<Vec<RowData>> {
        Ok(self.state().rows.clone())
    }

    async fn check_radio(&self, value: &str) -> Result<()> {
        self.state().checked.push(value.to_string());
        Ok(())
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        Ok(())
    }
}

/// 固定返回同一个答案的求解器
pub struct FixedSolver(pub Option<String>);

#[async_trait]
impl CaptchaSolver for FixedSolver {
    async fn request_solution(&self, _image: &[u8]) -> Option<String> {
        self.0.clone()
    }
}

pub fn row(name: &str, prof: &str, time: &str, code: &str) -> RowData {
    RowData {
        display_name: name.to_string(),
        professor: prof.to_string(),
        time: time.to_string(),
        code: code.to_string(),
    }
}
