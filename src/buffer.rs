use crate::record::LogEntry;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

/// In-memory queue of entries waiting to be shipped.
///
/// All mutation goes through a single mutex, so appending and checking the
/// batch threshold happen as one step and a drain hands out each entry to
/// exactly one caller. When a `capacity` is set the queue behaves as a ring:
/// the oldest entries are evicted and counted in [`LogBuffer::dropped`].
#[derive(Debug)]
pub struct LogBuffer {
    entries: Mutex<VecDeque<LogEntry>>,
    threshold: usize,
    capacity: Option<usize>,
    dropped: AtomicU64,
}

impl LogBuffer {
    /// `threshold` below 1 is treated as 1; a `capacity` of 0 as 1.
    pub fn new(threshold: usize, capacity: Option<usize>) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            threshold: threshold.max(1),
            capacity: capacity.map(|c| c.max(1)),
            dropped: AtomicU64::new(0),
        }
    }

    // A panic while holding the lock can't leave the deque half-updated,
    // so a poisoned guard is still safe to use.
    fn lock(&self) -> MutexGuard<'_, VecDeque<LogEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Push `entry` to the tail and report whether the threshold is reached.
    pub fn append(&self, entry: LogEntry) -> bool {
        let mut entries = self.lock();
        entries.push_back(entry);
        self.evict_overflow(&mut entries);
        entries.len() >= self.threshold
    }

    /// Take every buffered entry, leaving the buffer empty.
    pub fn drain_all(&self) -> Vec<LogEntry> {
        let mut entries = self.lock();
        entries.drain(..).collect()
    }

    /// Put a failed batch back at the head, ahead of anything appended
    /// since it was drained.
    pub fn requeue_front(&self, batch: Vec<LogEntry>) {
        if batch.is_empty() {
            return;
        }
        let mut entries = self.lock();
        for entry in batch.into_iter().rev() {
            entries.push_front(entry);
        }
        self.evict_overflow(&mut entries);
    }

    fn evict_overflow(&self, entries: &mut VecDeque<LogEntry>) {
        let Some(capacity) = self.capacity else {
            return;
        };
        if entries.len() <= capacity {
            return;
        }
        let excess = entries.len() - capacity;
        entries.drain(..excess);
        self.dropped.fetch_add(excess as u64, Ordering::Relaxed);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Count entries discarded without ever entering the buffer.
    pub fn record_dropped(&self, count: u64) {
        self.dropped.fetch_add(count, Ordering::Relaxed);
    }

    /// Entries evicted because the buffer was full, plus any recorded via
    /// [`record_dropped`](Self::record_dropped).
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Copy of the buffered lines, oldest first.
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.lock().iter().cloned().collect()
    }
}
