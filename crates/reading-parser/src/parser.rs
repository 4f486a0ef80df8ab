//! Reading Parser Implementation

use crate::error::ParseError;

/// Parse a text payload into a reading value.
///
/// The message is trimmed first. When it contains `=` anywhere but the last
/// position, the text after the first `=` is the number; otherwise the whole
/// message is. No clamping is applied here.
pub fn parse_reading(message: &str) -> Result<f64, ParseError> {
    let message = message.trim();
    if message.is_empty() {
        return Err(ParseError::Empty);
    }

    let candidate = match message.find('=') {
        Some(idx) if idx < message.len() - 1 => message[idx + 1..].trim(),
        _ => message,
    };

    let value: f64 = candidate.parse().map_err(|_| ParseError::InvalidNumber {
        raw: message.to_string(),
    })?;

    if !value.is_finite() {
        return Err(ParseError::NonFinite {
            raw: message.to_string(),
        });
    }

    Ok(value)
}

/// Decode a raw datagram as UTF-8 and parse it
pub fn parse_datagram(payload: &[u8]) -> Result<f64, ParseError> {
    let text = std::str::from_utf8(payload).map_err(|_| ParseError::InvalidUtf8 {
        raw: String::from_utf8_lossy(payload).trim().to_string(),
    })?;
    parse_reading(text)
}
