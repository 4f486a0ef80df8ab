//! Listener Error Types

use crate::listener::ListenerState;
use std::net::SocketAddr;
use thiserror::Error;

/// Errors returned by listener lifecycle calls
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Socket could not be bound (port in use, permission denied, ...)
    #[error("Failed to bind UDP socket on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// `stop` was called before the start completed
    #[error("Listener was stopped while starting")]
    Cancelled,

    /// Operation not allowed in the current state
    #[error("Listener is {0:?}")]
    InvalidState(ListenerState),
}
