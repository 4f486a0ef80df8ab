//! Listener statistics and diagnostics

use metrics::counter;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

/// Counters updated by the receive loop
#[derive(Debug, Default)]
pub struct ListenerStats {
    datagrams: AtomicU64,
    readings: AtomicU64,
    parse_failures: AtomicU64,
    transport_errors: AtomicU64,
    dropped: AtomicU64,
    last_raw_message: Mutex<Option<String>>,
}

/// Point-in-time copy of [`ListenerStats`]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub datagrams: u64,
    pub readings: u64,
    pub parse_failures: u64,
    pub transport_errors: u64,
    pub dropped: u64,
    pub last_raw_message: Option<String>,
}

impl ListenerStats {
    pub(crate) fn record_datagram(&self, raw: String) {
        self.datagrams.fetch_add(1, Ordering::Relaxed);
        counter!("force_listener_datagrams_total").increment(1);
        *self
            .last_raw_message
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(raw);
    }

    pub(crate) fn record_reading(&self) {
        self.readings.fetch_add(1, Ordering::Relaxed);
        counter!("force_listener_readings_total").increment(1);
    }

    pub(crate) fn record_parse_failure(&self) {
        self.parse_failures.fetch_add(1, Ordering::Relaxed);
        counter!("force_listener_parse_failures_total").increment(1);
    }

    pub(crate) fn record_transport_error(&self) {
        self.transport_errors.fetch_add(1, Ordering::Relaxed);
        counter!("force_listener_transport_errors_total").increment(1);
    }

    pub(crate) fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
        counter!("force_listener_dropped_total").increment(1);
    }

    /// Last raw message received, parsed or not
    pub fn last_raw_message(&self) -> Option<String> {
        self.last_raw_message
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Copy all counters
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            datagrams: self.datagrams.load(Ordering::Relaxed),
            readings: self.readings.load(Ordering::Relaxed),
            parse_failures: self.parse_failures.load(Ordering::Relaxed),
            transport_errors: self.transport_errors.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            last_raw_message: self.last_raw_message(),
        }
    }
}
