//! Force Reading Parser
//!
//! Turns the text payload of a sensor datagram into a numeric reading.
//! Accepts a bare number (`3.47`) or a `key=value` pair (`force=3.47`).

mod error;
mod parser;

pub use error::ParseError;
pub use parser::{parse_datagram, parse_reading};
