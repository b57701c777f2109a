use anyhow::Result;
use tracing::info;
use warlock::utils::logging;
use warlock::{App, Config, Mode};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::from_env();

    // 初始化日志
    let log_file = logging::init(&config)?;
    info!("日志文件: {}", log_file.display());

    // 运行模式：track（默认）/ war / autofill
    let mode = match std::env::args().nth(1) {
        Some(arg) => arg.parse::<Mode>()?,
        None => Mode::Track,
    };

    App::new(config, mode).run().await
}
