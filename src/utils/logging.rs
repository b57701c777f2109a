//! 日志工具模块
//!
//! 日志初始化（控制台 + 文件）以及格式化输出的辅助函数

use crate::config::Config;
use anyhow::{anyhow, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// 初始化日志
///
/// 控制台与 `{LOG_DIR}/{启动时间}.log` 同时输出；`RUST_LOG` 优先于 `VERBOSE_LOGGING`
///
/// # 返回
/// 返回本次运行的日志文件路径
pub fn init(config: &Config) -> Result<PathBuf> {
    let log_file_path = init_log_file(Path::new(&config.log_dir))?;
    let file = File::options().append(true).open(&log_file_path)?;

    let level = if config.verbose_logging { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,warlock={}", level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false),
        )
        .try_init()
        .map_err(|e| anyhow!("初始化日志失败: {}", e))?;

    Ok(log_file_path)
}

/// 创建日志文件并写入文件头
///
/// # 参数
/// - `log_dir`: 日志目录，不存在时自动创建
pub fn init_log_file(log_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(log_dir)?;
    let now = chrono::Local::now();
    let path = log_dir.join(format!("{}.log", now.format("%Y%m%d_%H%M%S")));

    let log_header = format!(
        "{}\nWarlock 运行日志 - {}\n{}\n\n",
        "=".repeat(60),
        now.format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    let mut file = File::create(&path)?;
    file.write_all(log_header.as_bytes())?;
    Ok(path)
}

/// 记录程序启动信息
pub fn log_startup(mode: &str, config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - {} 模式", mode);
    info!("👤 账号: {}", config.username);
    info!(
        "🖥️ 浏览器: {}",
        match config.browser_debug_port {
            Some(port) => format!("连接已有浏览器 (端口 {})", port),
            None if config.headless => "无头模式".to_string(),
            None => "窗口模式".to_string(),
        }
    );
    info!(
        "🔐 验证码: {}",
        if config.auth_discord_webhook_url.is_some() {
            "Discord Webhook + 标准输入"
        } else {
            "人工处理"
        }
    );
    info!("{}", "=".repeat(60));
}

/// 记录一轮检查的开始
pub fn log_cycle_start(mode: &str, cycle: usize) {
    info!("\n{}", "─".repeat(60));
    info!("🔁 [{} 第 {} 轮] {}", mode, cycle, chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
    info!("{}", "─".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("Jadwal", 10), "Jadwal");
        assert_eq!(truncate_text("选课系统页面", 2), "选课...");
    }

    #[test]
    fn test_init_log_file_writes_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = init_log_file(&dir.path().join("log")).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with(&"=".repeat(60)));
        assert!(content.contains("Warlock 运行日志"));
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("log"));
    }
}
