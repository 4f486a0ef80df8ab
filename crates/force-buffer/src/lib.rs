//! Bounded Force Reading Buffer
//!
//! Stores recent force readings behind a single lock and hands the newest
//! one to a polling consumer through a single-slot mailbox.

mod buffer;
mod error;
mod events;
mod host;
mod notifier;

pub use buffer::{ReadingBuffer, DEFAULT_CAPACITY};
pub use error::BufferError;
pub use events::{BufferEvent, EventBus, SubscriptionId};
pub use host::BufferHost;
pub use notifier::PollingNotifier;

use serde::{Deserialize, Serialize};

/// A single non-negative force measurement
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Reading(f64);

impl Reading {
    /// Create a reading, clamping negative and NaN input to zero
    pub fn new(raw: f64) -> Self {
        if raw > 0.0 {
            Self(raw)
        } else {
            Self(0.0)
        }
    }

    /// Measured value
    pub fn value(self) -> f64 {
        self.0
    }
}

impl From<Reading> for f64 {
    fn from(reading: Reading) -> Self {
        reading.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_clamps_negative() {
        assert_eq!(Reading::new(-3.0).value(), 0.0);
        assert_eq!(Reading::new(f64::NAN).value(), 0.0);
        assert!(Reading::new(-0.0).value().is_sign_positive());
        assert_eq!(f64::from(Reading::new(4.5)), 4.5);
    }
}
