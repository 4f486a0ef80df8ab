//! Listener configuration

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Default UDP port (matches the sensor firmware)
pub const DEFAULT_PORT: u16 = 4210;

/// Listener configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Local address to bind
    pub bind_ip: IpAddr,

    /// UDP port to listen on (0 = OS-assigned)
    pub port: u16,

    /// How long `stop` waits for the receive task to exit (milliseconds)
    pub stop_timeout_ms: u64,

    /// Largest accepted datagram; longer ones are dropped as parse failures
    pub max_datagram_size: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_ip: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            stop_timeout_ms: 100,
            max_datagram_size: 1024,
        }
    }
}

impl ListenerConfig {
    /// Loopback config on the given port
    pub fn localhost(port: u16) -> Self {
        Self {
            bind_ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port,
            ..Default::default()
        }
    }

    /// Clamp an operator-supplied port into the valid range
    pub fn clamp_port(raw: i64) -> u16 {
        raw.clamp(0, u16::MAX as i64) as u16
    }

    /// Socket address to bind
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.port)
    }

    /// Bounded wait used by `stop`
    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }
}
