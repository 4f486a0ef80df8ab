//! Application Error Types

use force_buffer::BufferError;
use thiserror::Error;
use udp_listener::ListenerError;

/// Errors surfaced by the composition root
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Buffer lifecycle error
    #[error(transparent)]
    Buffer(#[from] BufferError),

    /// Listener could not be started
    #[error(transparent)]
    Listener(#[from] ListenerError),

    /// Logging subscriber could not be installed
    #[error("Logging setup failed: {0}")]
    Logging(String),

    /// Metrics exporter could not be installed
    #[error("Metrics setup failed: {0}")]
    Metrics(String),
}
