//! Parse Error Types

use thiserror::Error;

/// Errors produced while parsing a reading payload
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Payload was empty or whitespace only
    #[error("Empty message")]
    Empty,

    /// Payload was not valid UTF-8
    #[error("Message is not valid UTF-8: {raw:?}")]
    InvalidUtf8 { raw: String },

    /// Candidate text is not a floating-point number
    #[error("Could not parse message: {raw:?}")]
    InvalidNumber { raw: String },

    /// Number parsed but is infinite or NaN
    #[error("Reading is not finite: {raw:?}")]
    NonFinite { raw: String },
}

impl ParseError {
    /// Raw message that failed to parse, kept for diagnostics
    pub fn raw(&self) -> Option<&str> {
        match self {
            ParseError::Empty => None,
            ParseError::InvalidUtf8 { raw }
            | ParseError::InvalidNumber { raw }
            | ParseError::NonFinite { raw } => Some(raw),
        }
    }
}
