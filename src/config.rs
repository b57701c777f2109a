use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// 程序配置
///
/// 在 `main` 中构造一次，之后以引用方式传给各个组件
#[derive(Clone, Debug)]
pub struct Config {
    // --- SIAK 账号 ---
    pub username: String,
    pub password: String,
    // --- 浏览器 ---
    /// 是否无头运行（无头模式下没有配置验证码求解器即视为致命）
    pub headless: bool,
    /// 自定义浏览器可执行文件
    pub browser_executable: Option<String>,
    /// 连接已运行浏览器的调试端口，设置后不再自行启动浏览器
    pub browser_debug_port: Option<u16>,
    // --- 登录 ---
    /// 登录/验证码最大重试次数
    pub captcha_max_retries: usize,
    /// 仍停留在登录页时的退避基数（秒）
    pub login_backoff_secs: u64,
    // --- 课表追踪 ---
    pub tracked_url: String,
    /// 检查间隔（秒）
    pub tracker_interval: u64,
    pub tracker_discord_webhook_url: Option<String>,
    pub tracker_suppress_professor_change: bool,
    pub tracker_suppress_location_change: bool,
    pub cache_file: String,
    // --- 验证码通知 ---
    pub auth_discord_webhook_url: Option<String>,
    pub user_id: Option<String>,
    /// 机器人令牌与频道，两者都设置时读取频道中的回复作为答案
    pub discord_token: Option<String>,
    pub discord_channel_id: Option<String>,
    /// 频道轮询间隔（秒）
    pub discord_poll_interval: u64,
    // --- 抢课 ---
    pub warbot_interval: u64,
    pub warbot_autosubmit: bool,
    /// 有目标课程未找到时视为失败并重试
    pub warbot_notfound_retry: bool,
    /// 目标课程配置文件，为空时按默认文件名查找
    pub courses_file: Option<String>,
    // --- 日志 ---
    pub log_dir: String,
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            headless: true,
            browser_executable: None,
            browser_debug_port: None,
            captcha_max_retries: 5,
            login_backoff_secs: 2,
            tracked_url: String::new(),
            tracker_interval: 1200,
            tracker_discord_webhook_url: None,
            tracker_suppress_professor_change: false,
            tracker_suppress_location_change: false,
            cache_file: "data/latest_courses.txt".to_string(),
            auth_discord_webhook_url: None,
            user_id: None,
            discord_token: None,
            discord_channel_id: None,
            discord_poll_interval: 2,
            warbot_interval: 5,
            warbot_autosubmit: true,
            warbot_notfound_retry: true,
            courses_file: None,
            log_dir: "log".to_string(),
            verbose_logging: false,
        }
    }
}

/// 未指定 COURSES_FILE 时依次查找的文件
pub const DEFAULT_COURSES_FILES: [&str; 4] =
    ["courses.yaml", "courses.yml", "courses.json", "courses.toml"];

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源构造配置，便于测试
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let default = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let flag = |key: &str, fallback: bool| {
            lookup(key).map(|v| is_truthy(&v)).unwrap_or(fallback)
        };
        let number = |key: &str, fallback: u64| {
            lookup(key)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(fallback)
        };

        Self {
            username: lookup("USERNAME").unwrap_or(default.username),
            password: lookup("PASSWORD").unwrap_or(default.password),
            headless: flag("HEADLESS", default.headless),
            browser_executable: non_empty("BROWSER_EXECUTABLE"),
            browser_debug_port: lookup("BROWSER_DEBUG_PORT").and_then(|v| v.parse().ok()),
            captcha_max_retries: lookup("CAPTCHA_MAX_RETRIES")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default.captcha_max_retries),
            login_backoff_secs: number("LOGIN_BACKOFF_SECS", default.login_backoff_secs),
            tracked_url: lookup("TRACKED_URL").unwrap_or(default.tracked_url),
            tracker_interval: number("TRACKER_INTERVAL", default.tracker_interval),
            tracker_discord_webhook_url: non_empty("TRACKER_DISCORD_WEBHOOK_URL"),
            tracker_suppress_professor_change: flag(
                "TRACKER_SUPPRESS_PROFESSOR_CHANGE",
                default.tracker_suppress_professor_change,
            ),
            tracker_suppress_location_change: flag(
                "TRACKER_SUPPRESS_LOCATION_CHANGE",
                default.tracker_suppress_location_change,
            ),
            cache_file: lookup("CACHE_FILE").unwrap_or(default.cache_file),
            auth_discord_webhook_url: non_empty("AUTH_DISCORD_WEBHOOK_URL"),
            user_id: non_empty("USER_ID"),
            discord_token: non_empty("DISCORD_TOKEN"),
            discord_channel_id: non_empty("DISCORD_CHANNEL_ID"),
            discord_poll_interval: number("DISCORD_POLL_INTERVAL", default.discord_poll_interval),
            warbot_interval: number("WARBOT_INTERVAL", default.warbot_interval),
            warbot_autosubmit: flag("WARBOT_AUTOSUBMIT", default.warbot_autosubmit),
            warbot_notfound_retry: flag("WARBOT_NOTFOUND_RETRY", default.warbot_notfound_retry),
            courses_file: non_empty("COURSES_FILE"),
            log_dir: lookup("LOG_DIR").unwrap_or(default.log_dir),
            verbose_logging: flag("VERBOSE_LOGGING", default.verbose_logging),
        }
    }

    /// 校验所有模式都需要的配置项
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.username.is_empty() {
            return Err(ConfigError::EnvVarNotFound {
                var_name: "USERNAME".to_string(),
            });
        }
        if self.password.is_empty() {
            return Err(ConfigError::EnvVarNotFound {
                var_name: "PASSWORD".to_string(),
            });
        }
        Ok(())
    }

    /// 追踪模式额外需要的配置项
    pub fn validate_tracker(&self) -> Result<(), ConfigError> {
        self.validate()?;
        if self.tracked_url.is_empty() {
            return Err(ConfigError::EnvVarNotFound {
                var_name: "TRACKED_URL".to_string(),
            });
        }
        if self.tracker_discord_webhook_url.is_none() {
            return Err(ConfigError::EnvVarNotFound {
                var_name: "TRACKER_DISCORD_WEBHOOK_URL".to_string(),
            });
        }
        Ok(())
    }

    /// 机器人令牌与频道 ID 都已配置时返回二者
    pub fn discord_reply_channel(&self) -> Option<(&str, &str)> {
        Some((
            self.discord_token.as_deref()?,
            self.discord_channel_id.as_deref()?,
        ))
    }

    /// 解析目标课程配置文件路径
    pub fn resolve_courses_file(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.courses_file {
            return Ok(PathBuf::from(path));
        }
        DEFAULT_COURSES_FILES
            .iter()
            .map(Path::new)
            .find(|p| p.exists())
            .map(Path::to_path_buf)
            .ok_or_else(|| ConfigError::CoursesFileNotFound {
                candidates: DEFAULT_COURSES_FILES.join(", "),
            })
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_env_empty() {
        let config = Config::from_lookup(|_| None);
        assert!(config.headless);
        assert_eq!(config.tracker_interval, 1200);
        assert_eq!(config.captcha_max_retries, 5);
        assert_eq!(config.warbot_interval, 5);
        assert!(config.tracker_discord_webhook_url.is_none());
    }

    #[test]
    fn test_truthy_values() {
        let config = Config::from_lookup(lookup_from(&[
            ("HEADLESS", "no"),
            ("TRACKER_SUPPRESS_PROFESSOR_CHANGE", "YES"),
            ("TRACKER_SUPPRESS_LOCATION_CHANGE", "1"),
            ("WARBOT_AUTOSUBMIT", "false"),
        ]));
        assert!(!config.headless);
        assert!(config.tracker_suppress_professor_change);
        assert!(config.tracker_suppress_location_change);
        assert!(!config.warbot_autosubmit);
    }

    #[test]
    fn test_unparsable_numbers_fall_back() {
        let config = Config::from_lookup(lookup_from(&[
            ("TRACKER_INTERVAL", "soon"),
            ("BROWSER_DEBUG_PORT", "9222"),
        ]));
        assert_eq!(config.tracker_interval, 1200);
        assert_eq!(config.browser_debug_port, Some(9222));
    }

    #[test]
    fn test_reply_channel_needs_token_and_channel() {
        let config = Config::from_lookup(lookup_from(&[("DISCORD_TOKEN", "t0ken")]));
        assert_eq!(config.discord_reply_channel(), None);

        let config = Config::from_lookup(lookup_from(&[
            ("DISCORD_TOKEN", "t0ken"),
            ("DISCORD_CHANNEL_ID", "1234"),
            ("DISCORD_POLL_INTERVAL", "5"),
        ]));
        assert_eq!(config.discord_reply_channel(), Some(("t0ken", "1234")));
        assert_eq!(config.discord_poll_interval, 5);
    }

    #[test]
    fn test_validate_requires_credentials() {
        let config = Config::from_lookup(lookup_from(&[("USERNAME", "fazuh")]));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EnvVarNotFound { ref var_name }) if var_name == "PASSWORD"
        ));
    }

    #[test]
    fn test_validate_tracker_requires_webhook() {
        let config = Config::from_lookup(lookup_from(&[
            ("USERNAME", "u"),
            ("PASSWORD", "p"),
            ("TRACKED_URL", "https://academic.ui.ac.id/main/Schedule/Index?period=2025-2"),
        ]));
        assert!(config.validate().is_ok());
        assert!(config.validate_tracker().is_err());
    }
}
