pub mod logging;

use tracing::{info, warn};

/// 保持浏览器打开直到用户按下 Ctrl+C
pub async fn wait_for_shutdown() {
    info!("💡 按 Ctrl+C 退出");
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("监听 Ctrl+C 失败: {}", e);
    }
    info!("收到退出信号");
}
