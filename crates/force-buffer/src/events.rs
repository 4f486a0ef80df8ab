//! Buffer Event Bus

use crate::Reading;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::trace;

/// Notifications published to presentation-layer collaborators
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BufferEvent {
    /// A buffer became active
    Initialized { capacity: usize },
    /// History was cleared
    Reset,
    /// A new reading was drained by the consumer cycle
    NewValue(Reading),
}

/// Handle returned by [`EventBus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback = Arc<dyn Fn(&BufferEvent) + Send + Sync>;

/// Fan-out of buffer events to registered callbacks
pub struct EventBus {
    subscribers: Mutex<Vec<(SubscriptionId, Callback)>>,
    next_id: AtomicU64,
}

impl EventBus {
    /// Create an empty event bus
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a callback for every future event
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&BufferEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(callback)));
        id
    }

    /// Remove a callback. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(PoisonError::into_inner);
        let before = subscribers.len();
        subscribers.retain(|(sub, _)| *sub != id);
        subscribers.len() != before
    }

    /// Number of registered callbacks
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Deliver an event to every subscriber on the calling thread
    pub fn emit(&self, event: &BufferEvent) {
        // Callbacks run without the list locked so they can (un)subscribe.
        let callbacks: Vec<Callback> = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, callback)| callback.clone())
            .collect();

        trace!("Emitting {:?} to {} subscribers", event, callbacks.len());
        for callback in callbacks {
            callback(event);
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
