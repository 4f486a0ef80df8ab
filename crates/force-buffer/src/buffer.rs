//! Bounded Reading Buffer Implementation

use crate::events::{BufferEvent, EventBus};
use crate::Reading;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// Default buffer capacity (readings)
pub const DEFAULT_CAPACITY: usize = 100;

/// State guarded by the buffer lock. Every field changes together.
struct BufferState {
    /// Readings, oldest first
    history: VecDeque<Reading>,
    /// Maximum history length (always >= 1)
    capacity: usize,
    /// Most recently inserted reading
    latest: Option<Reading>,
    /// Single-slot mailbox, overwritten on every insert
    pending: Option<Reading>,
    /// Readings inserted since creation
    total_inserted: u64,
}

impl BufferState {
    fn evict_overflow(&mut self) {
        while self.history.len() > self.capacity {
            self.history.pop_front();
        }
    }
}

/// Thread-safe bounded buffer of force readings.
///
/// Producers call [`insert`](Self::insert) from any thread; a consumer polls
/// [`drain_pending`](Self::drain_pending) once per cycle to pick up the
/// newest value. Values inserted between two drains are only reachable
/// through the history accessors.
pub struct ReadingBuffer {
    state: Mutex<BufferState>,
    events: Arc<EventBus>,
}

impl ReadingBuffer {
    /// Create a buffer with its own event bus
    pub fn new(capacity: usize) -> Self {
        Self::with_events(capacity, Arc::new(EventBus::new()))
    }

    /// Create a buffer with default capacity (100 readings)
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }

    /// Create a buffer publishing to a shared event bus
    pub fn with_events(capacity: usize, events: Arc<EventBus>) -> Self {
        let capacity = capacity.max(1);
        debug!("Creating force buffer with capacity {}", capacity);
        Self {
            state: Mutex::new(BufferState {
                history: VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY)),
                capacity,
                latest: None,
                pending: None,
                total_inserted: 0,
            }),
            events,
        }
    }

    fn lock(&self) -> MutexGuard<'_, BufferState> {
        // No critical section can panic halfway, so a poisoned guard still holds consistent state.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Event bus this buffer publishes to
    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// Insert a reading, evicting the oldest when full.
    ///
    /// Negative values are stored as zero. The mailbox is overwritten
    /// whether or not its previous value was drained.
    pub fn insert(&self, value: f64) -> Reading {
        let reading = Reading::new(value);
        let mut state = self.lock();
        state.history.push_back(reading);
        state.evict_overflow();
        state.latest = Some(reading);
        state.pending = Some(reading);
        state.total_inserted += 1;
        reading
    }

    /// Take the pending reading, if one arrived since the last drain
    pub fn drain_pending(&self) -> Option<Reading> {
        self.lock().pending.take()
    }

    /// Copy of the full history, oldest first
    pub fn snapshot(&self) -> Vec<Reading> {
        self.lock().history.iter().copied().collect()
    }

    /// Up to `count` oldest readings, oldest first
    pub fn oldest(&self, count: usize) -> Vec<Reading> {
        self.lock().history.iter().take(count).copied().collect()
    }

    /// Up to `count` newest readings, oldest first
    pub fn newest(&self, count: usize) -> Vec<Reading> {
        let state = self.lock();
        let skip = state.history.len().saturating_sub(count);
        state.history.iter().skip(skip).copied().collect()
    }

    /// Most recently inserted reading
    pub fn latest(&self) -> Option<Reading> {
        self.lock().latest
    }

    /// Number of readings currently stored
    pub fn len(&self) -> usize {
        self.lock().history.len()
    }

    /// Maximum number of readings retained
    pub fn capacity(&self) -> usize {
        self.lock().capacity
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.lock().history.is_empty()
    }

    /// Check if buffer is full
    pub fn is_full(&self) -> bool {
        let state = self.lock();
        state.history.len() >= state.capacity
    }

    /// Check if buffer holds at least one reading
    pub fn has_value(&self) -> bool {
        !self.is_empty()
    }

    /// Get fill ratio (0.0 to 1.0)
    pub fn fill_ratio(&self) -> f64 {
        let state = self.lock();
        state.history.len() as f64 / state.capacity as f64
    }

    /// Get total readings inserted (for statistics)
    pub fn total_inserted(&self) -> u64 {
        self.lock().total_inserted
    }

    /// Change the capacity (minimum 1), evicting oldest readings on shrink
    pub fn set_capacity(&self, capacity: usize) {
        let capacity = capacity.max(1);
        let mut state = self.lock();
        state.capacity = capacity;
        state.evict_overflow();
        debug!("Force buffer capacity set to {}", capacity);
    }

    /// Clear history and latest value, keeping capacity.
    ///
    /// Subscribers receive [`BufferEvent::Reset`] after the lock is released.
    pub fn reset(&self) {
        {
            let mut state = self.lock();
            state.history.clear();
            state.latest = None;
        }
        info!("Force buffer reset");
        self.events.emit(&BufferEvent::Reset);
    }
}

impl Default for ReadingBuffer {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn values(readings: &[Reading]) -> Vec<f64> {
        readings.iter().map(|r| r.value()).collect()
    }

    #[test]
    fn test_insert_and_read() {
        let buffer = ReadingBuffer::new(10);
        for i in 0..5 {
            buffer.insert(i as f64);
        }

        assert_eq!(buffer.len(), 5);
        assert_eq!(values(&buffer.snapshot()), vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        assert_eq!(values(&buffer.oldest(2)), vec![0.0, 1.0]);
        assert_eq!(values(&buffer.newest(3)), vec![2.0, 3.0, 4.0]);
        assert_eq!(buffer.latest(), Some(Reading::new(4.0)));
    }

    #[test]
    fn test_fifo_eviction() {
        let buffer = ReadingBuffer::new(3);
        for i in 1..=4 {
            buffer.insert(i as f64);
        }

        assert_eq!(buffer.len(), 3);
        assert_eq!(values(&buffer.oldest(1)), vec![2.0]);
        assert_eq!(values(&buffer.newest(1)), vec![4.0]);
        assert_eq!(buffer.total_inserted(), 4);
    }

    #[test]
    fn test_window_requests_are_capacity_limited() {
        let buffer = ReadingBuffer::new(10);
        buffer.insert(1.0);
        buffer.insert(2.0);

        assert_eq!(buffer.oldest(5).len(), 2);
        assert_eq!(buffer.newest(5).len(), 2);
        assert!(buffer.oldest(0).is_empty());
        assert!(buffer.newest(0).is_empty());
    }

    #[test]
    fn test_latest_wins_mailbox() {
        let buffer = ReadingBuffer::new(10);
        assert_eq!(buffer.drain_pending(), None);

        buffer.insert(1.5);
        buffer.insert(2.5);
        assert_eq!(buffer.drain_pending(), Some(Reading::new(2.5)));
        assert_eq!(buffer.drain_pending(), None);

        // the skipped value is still in history
        assert_eq!(values(&buffer.snapshot()), vec![1.5, 2.5]);
    }

    #[test]
    fn test_snapshot_is_independent() {
        let buffer = ReadingBuffer::new(10);
        buffer.insert(1.0);
        buffer.insert(2.0);

        let mut copy = buffer.snapshot();
        copy.clear();
        copy.push(Reading::new(99.0));

        assert_eq!(buffer.len(), 2);
        assert_eq!(values(&buffer.newest(1)), vec![2.0]);
    }

    #[test]
    fn test_clamp_on_insert() {
        let buffer = ReadingBuffer::new(10);
        let stored = buffer.insert(-3.0);
        assert_eq!(stored.value(), 0.0);
        assert_eq!(values(&buffer.snapshot()), vec![0.0]);
        assert_eq!(buffer.drain_pending(), Some(Reading::new(0.0)));
    }

    #[test]
    fn test_capacity_clamped_to_one() {
        let buffer = ReadingBuffer::new(0);
        assert_eq!(buffer.capacity(), 1);

        buffer.set_capacity(0);
        assert_eq!(buffer.capacity(), 1);
    }

    #[test]
    fn test_huge_capacity_does_not_preallocate() {
        let buffer = ReadingBuffer::new(usize::MAX);
        assert_eq!(buffer.capacity(), usize::MAX);

        buffer.insert(1.0);
        buffer.insert(2.0);
        assert_eq!(buffer.len(), 2);
        assert!(!buffer.is_full());
        assert_eq!(buffer.latest(), Some(Reading::new(2.0)));
    }

    #[test]
    fn test_shrink_evicts_oldest() {
        let buffer = ReadingBuffer::new(10);
        for i in 0..8 {
            buffer.insert(i as f64);
        }

        buffer.set_capacity(3);
        assert_eq!(buffer.len(), 3);
        assert_eq!(values(&buffer.snapshot()), vec![5.0, 6.0, 7.0]);
        assert!(buffer.is_full());
    }

    #[test]
    fn test_predicates() {
        let buffer = ReadingBuffer::new(2);
        assert!(buffer.is_empty());
        assert!(!buffer.has_value());
        assert!(!buffer.is_full());
        assert_eq!(buffer.fill_ratio(), 0.0);

        buffer.insert(1.0);
        assert!(buffer.has_value());
        assert!((buffer.fill_ratio() - 0.5).abs() < f64::EPSILON);

        buffer.insert(2.0);
        assert!(buffer.is_full());
    }

    #[test]
    fn test_reset_keeps_capacity() {
        let buffer = ReadingBuffer::new(100);
        let resets = Arc::new(AtomicUsize::new(0));
        let counter = resets.clone();
        buffer.events().subscribe(move |event| {
            if *event == BufferEvent::Reset {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        buffer.set_capacity(50);
        for i in 0..7 {
            buffer.insert(i as f64);
        }
        buffer.reset();

        assert_eq!(buffer.len(), 0);
        assert_eq!(buffer.capacity(), 50);
        assert_eq!(buffer.latest(), None);
        assert_eq!(resets.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_reset_subscriber_can_read_buffer() {
        // Reset is emitted outside the lock, so subscribers may call back in.
        let buffer = Arc::new(ReadingBuffer::new(4));
        let observed = Arc::new(AtomicUsize::new(usize::MAX));
        let (inner, seen) = (Arc::downgrade(&buffer), observed.clone());
        buffer.events().subscribe(move |_| {
            if let Some(buffer) = inner.upgrade() {
                seen.store(buffer.len(), Ordering::SeqCst);
            }
        });

        buffer.insert(1.0);
        buffer.reset();
        assert_eq!(observed.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_concurrent_producer_and_consumer() {
        let buffer = Arc::new(ReadingBuffer::new(16));
        let producer = {
            let buffer = buffer.clone();
            std::thread::spawn(move || {
                for i in 0..1000 {
                    buffer.insert(i as f64);
                }
            })
        };

        let mut drained = 0;
        for _ in 0..1000 {
            if buffer.drain_pending().is_some() {
                drained += 1;
            }
            assert!(buffer.len() <= buffer.capacity());
        }
        producer.join().unwrap();

        assert!(drained <= 1000);
        assert_eq!(buffer.len(), 16);
        assert_eq!(buffer.latest(), Some(Reading::new(999.0)));
        assert_eq!(buffer.total_inserted(), 1000);
    }

    proptest! {
        #[test]
        fn prop_size_never_exceeds_capacity(
            capacity in 1usize..64,
            inserts in proptest::collection::vec(-100.0f64..100.0, 0..256),
            shrink_to in 0usize..64,
        ) {
            let buffer = ReadingBuffer::new(capacity);
            for value in &inserts {
                buffer.insert(*value);
                prop_assert!(buffer.len() <= buffer.capacity());
            }

            buffer.set_capacity(shrink_to);
            prop_assert!(buffer.len() <= buffer.capacity());
            prop_assert!(buffer.capacity() >= 1);
        }

        #[test]
        fn prop_history_is_newest_suffix(
            capacity in 1usize..32,
            inserts in proptest::collection::vec(0.0f64..100.0, 1..128),
        ) {
            let buffer = ReadingBuffer::new(capacity);
            for value in &inserts {
                buffer.insert(*value);
            }

            let keep = inserts.len().min(capacity);
            let expected = inserts[inserts.len() - keep..].to_vec();
            prop_assert_eq!(values(&buffer.snapshot()), expected);
            prop_assert_eq!(buffer.latest().map(Reading::value), inserts.last().copied());
            prop_assert!(buffer.snapshot().iter().all(|r| r.value() >= 0.0));
        }
    }
}
