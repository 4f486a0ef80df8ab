//! Force Monitor
//!
//! Composition root for the force telemetry sink: loads configuration,
//! installs logging and metrics, and drives the consumer cycle.

mod settings;
mod error;
mod monitor;

pub use settings::{
    load_config, AppConfig, BufferSettings, ListenerSettings, LogSettings, MetricsSettings,
    MonitorSettings, DEFAULT_CONFIG_FILE, ENV_PREFIX,
};
pub use error::AppError;
pub use monitor::Monitor;

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Initialize logging
pub fn init_logging(settings: &LogSettings) -> Result<(), AppError> {
    let level: Level = settings
        .level
        .parse()
        .map_err(|_| AppError::Logging(format!("unknown log level {:?}", settings.level)))?;

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    let installed = if settings.json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };

    installed.map_err(|e| AppError::Logging(e.to_string()))
}

/// Install the Prometheus exporter on `addr`
pub fn install_metrics(addr: SocketAddr) -> Result<(), AppError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| AppError::Metrics(e.to_string()))?;

    info!("Metrics exporter listening on {}", addr);
    Ok(())
}
