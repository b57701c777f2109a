//! SIAK NG 门户
//!
//! 页面判断（纯函数）、地址常量、登录状态机

pub mod classifier;
pub mod path;
pub mod session;

pub use classifier::{classify, AuthState};
pub use session::{AuthSuccess, Credentials, SessionOptions, SessionStage, SiakSession};
