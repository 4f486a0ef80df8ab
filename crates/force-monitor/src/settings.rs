//! Application configuration
//!
//! Loaded from an optional TOML file, then overridden by environment
//! variables such as `FORCE_MONITOR__LISTENER__PORT=4211`.

use crate::error::AppError;
use config::{Config, Environment, File};
use force_buffer::DEFAULT_CAPACITY;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use tracing::warn;
use udp_listener::{ListenerConfig, DEFAULT_PORT};

/// Config file read when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "force-monitor.toml";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "FORCE_MONITOR";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub listener: ListenerSettings,
    pub buffer: BufferSettings,
    pub monitor: MonitorSettings,
    pub log: LogSettings,
    pub metrics: MetricsSettings,
}

/// Raw listener settings as supplied by the operator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenerSettings {
    pub bind_ip: IpAddr,
    /// Clamped into 0..=65535; 0 lets the OS pick a port
    pub port: i64,
    pub stop_timeout_ms: u64,
    pub max_datagram_size: usize,
}

impl Default for ListenerSettings {
    fn default() -> Self {
        let defaults = ListenerConfig::default();
        Self {
            bind_ip: defaults.bind_ip,
            port: DEFAULT_PORT as i64,
            stop_timeout_ms: defaults.stop_timeout_ms,
            max_datagram_size: defaults.max_datagram_size,
        }
    }
}

impl ListenerSettings {
    /// Validated listener config
    pub fn to_listener_config(&self) -> ListenerConfig {
        let port = ListenerConfig::clamp_port(self.port);
        if port as i64 != self.port {
            warn!("Listener port {} out of range, using {}", self.port, port);
        }
        ListenerConfig {
            bind_ip: self.bind_ip,
            port,
            stop_timeout_ms: self.stop_timeout_ms,
            max_datagram_size: self.max_datagram_size,
        }
    }
}

/// Buffer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferSettings {
    /// Initial capacity; values below 1 become 1
    pub capacity: i64,
}

impl Default for BufferSettings {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY as i64,
        }
    }
}

impl BufferSettings {
    /// Validated capacity
    pub fn capacity(&self) -> usize {
        if self.capacity < 1 {
            warn!("Buffer capacity {} is invalid, using 1", self.capacity);
            1
        } else {
            usize::try_from(self.capacity).unwrap_or(usize::MAX)
        }
    }
}

/// Consumer cycle and retry settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    /// Consumer cycles per second
    pub poll_hz: u32,
    /// Bind attempts before giving up
    pub bind_retries: u32,
    /// Delay between bind attempts (milliseconds)
    pub retry_backoff_ms: u64,
    /// Interval between statistics log lines (seconds)
    pub stats_interval_secs: u64,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            poll_hz: 60,
            bind_retries: 3,
            retry_backoff_ms: 500,
            stats_interval_secs: 10,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Maximum level: trace, debug, info, warn or error
    pub level: String,
    /// Emit JSON lines instead of human-readable text
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Prometheus exporter settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsSettings {
    /// Exporter address; disabled when unset
    pub listen_addr: Option<SocketAddr>,
}

/// Load configuration from `path` (or the default file) and the environment
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, AppError> {
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));

    let settings = Config::builder()
        .add_source(File::from(path).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}
