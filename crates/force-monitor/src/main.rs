//! Force Monitor - Main Entry Point

use force_monitor::{init_logging, install_metrics, load_config, Monitor};
use std::path::PathBuf;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = load_config(config_path.as_deref())?;
    init_logging(&config.log)?;

    info!("=== Force Monitor v{} ===", env!("CARGO_PKG_VERSION"));

    if let Some(addr) = config.metrics.listen_addr {
        install_metrics(addr)?;
    }

    let monitor = Monitor::new(config);
    let addr = monitor.start().await?;
    info!("Receiving force readings on {}", addr);

    monitor
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl-C: {}", e);
            }
        })
        .await;

    monitor.shutdown().await;
    Ok(())
}
