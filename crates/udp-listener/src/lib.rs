//! UDP Force Listener
//!
//! Receives force readings from the sensor over UDP on a background task
//! and pushes every parsed value into the active force buffer.

mod config;
mod error;
mod listener;
mod stats;

pub use config::{ListenerConfig, DEFAULT_PORT};
pub use error::ListenerError;
pub use listener::{ListenerState, UdpForceListener};
pub use stats::{ListenerStats, StatsSnapshot};
