//! Frame hand-off between the sampling loop and the responder.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

/// FIFO of published frames, drained wholesale by readers.
///
/// `push` never blocks beyond the internal lock. When a capacity is set and
/// the queue is full, the oldest frame is evicted and counted in
/// [`dropped`](Self::dropped). A capacity of 0 disables the bound.
///
/// `drain_all` swaps the whole buffer out under the lock, so concurrent
/// readers never see the same item twice.
#[derive(Debug)]
pub struct TelemetryQueue<T> {
    buffer: Mutex<VecDeque<T>>,
    capacity: usize,
    dropped: AtomicU64,
}

impl<T> TelemetryQueue<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: Mutex::new(VecDeque::new()),
            capacity,
            dropped: AtomicU64::new(0),
        }
    }

    pub fn unbounded() -> Self {
        Self::new(0)
    }

    /// Append `item`. Returns `true` if an older item was evicted to make room.
    pub fn push(&self, item: T) -> bool {
        let mut buffer = self.buffer.lock();
        let evicted = self.capacity > 0 && buffer.len() >= self.capacity;
        if evicted {
            buffer.pop_front();
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
        buffer.push_back(item);
        evicted
    }

    /// Remove and return everything queued, oldest first.
    pub fn drain_all(&self) -> Vec<T> {
        self.drain_all_with(|| ()).1
    }

    /// Drain under the lock and run `tag` before releasing it.
    ///
    /// Tags handed out this way follow the same order as the drained batches.
    pub fn drain_all_with<K>(&self, tag: impl FnOnce() -> K) -> (K, Vec<T>) {
        let mut buffer = self.buffer.lock();
        let items = std::mem::take(&mut *buffer);
        let key = tag();
        drop(buffer);
        (key, Vec::from(items))
    }

    pub fn len(&self) -> usize {
        self.buffer.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Items evicted by the capacity bound since creation.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl<T> Default for TelemetryQueue<T> {
    fn default() -> Self {
        Self::new(crate::DEFAULT_QUEUE_CAPACITY)
    }
}
