//! Buffer Lifecycle Host

use crate::buffer::ReadingBuffer;
use crate::error::BufferError;
use crate::events::{BufferEvent, EventBus};
use crate::Reading;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

/// Owner of the active force buffer.
///
/// Cloned into every component that needs the buffer. After
/// [`teardown`](Self::teardown), [`get`](Self::get) returns `None` so late
/// callers see the absence instead of a stale buffer.
#[derive(Clone, Default)]
pub struct BufferHost {
    active: Arc<RwLock<Option<Arc<ReadingBuffer>>>>,
    events: Arc<EventBus>,
}

impl BufferHost {
    /// Create a host with no active buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Event bus shared by every buffer this host creates
    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// Create the active buffer and emit [`BufferEvent::Initialized`]
    pub fn init(&self, capacity: usize) -> Result<Arc<ReadingBuffer>, BufferError> {
        let buffer = {
            let mut active = self.active.write().unwrap_or_else(PoisonError::into_inner);
            if let Some(existing) = active.as_ref() {
                return Err(BufferError::AlreadyInitialized {
                    capacity: existing.capacity(),
                });
            }
            let buffer = Arc::new(ReadingBuffer::with_events(capacity, self.events.clone()));
            *active = Some(buffer.clone());
            buffer
        };

        let capacity = buffer.capacity();
        info!("Force buffer initialized with capacity {}", capacity);
        self.events.emit(&BufferEvent::Initialized { capacity });
        Ok(buffer)
    }

    /// Active buffer, if any
    pub fn get(&self) -> Option<Arc<ReadingBuffer>> {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Check if a buffer is active
    pub fn is_active(&self) -> bool {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Insert into the active buffer. Returns `None` if torn down.
    pub fn insert(&self, value: f64) -> Option<Reading> {
        match self.get() {
            Some(buffer) => Some(buffer.insert(value)),
            None => {
                debug!("No active force buffer, dropping reading {}", value);
                None
            }
        }
    }

    /// Release the active buffer. Returns false if none was active.
    pub fn teardown(&self) -> bool {
        let released = self
            .active
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some();
        if released {
            info!("Force buffer torn down");
        }
        released
    }
}
