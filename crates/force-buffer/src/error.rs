//! Buffer Error Types

use thiserror::Error;

/// Errors raised by the buffer lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    /// `init` called while a buffer is already active
    #[error("Force buffer already initialized (capacity {capacity})")]
    AlreadyInitialized { capacity: usize },
}
