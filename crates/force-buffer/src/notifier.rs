//! Polling Notifier for the consumer cycle

use crate::events::BufferEvent;
use crate::host::BufferHost;
use crate::Reading;
use tracing::trace;

/// Drains the buffer mailbox once per consumer cycle.
///
/// Call [`poll`](Self::poll) from the consumer's update loop. At most one
/// [`BufferEvent::NewValue`] is emitted per call, carrying the newest reading
/// inserted since the previous call.
pub struct PollingNotifier {
    host: BufferHost,
}

impl PollingNotifier {
    /// Create a notifier for the host's active buffer
    pub fn new(host: BufferHost) -> Self {
        Self { host }
    }

    /// Run one cycle. Returns the drained reading, if any.
    pub fn poll(&self) -> Option<Reading> {
        let reading = self.host.get()?.drain_pending()?;
        trace!("Consumer cycle picked up {:?}", reading);
        self.host.events().emit(&BufferEvent::NewValue(reading));
        Some(reading)
    }
}
