//! Bounded FIFO buffer for formatted log records.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// A thread-safe record buffer with evict-oldest overflow.
///
/// Capacity `0` disables the bound. Mutation and snapshot-read take an
/// internal lock, so the logging emit path and attribute read/clear
/// callbacks may run on different threads.
///
/// Cloning is shallow; clones share the same underlying buffer.
#[derive(Clone, Debug)]
pub struct RecordBuffer {
    inner: Arc<Mutex<VecDeque<String>>>,
    capacity: usize,
}

impl RecordBuffer {
    /// Create a buffer holding at most `capacity` records (`0` = unbounded).
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(VecDeque::new())),
            capacity,
        }
    }

    /// Append one record, evicting the oldest while the buffer is full.
    pub fn push(&self, record: impl Into<String>) {
        let mut inner = self.inner.lock();
        Self::push_locked(&mut inner, self.capacity, record.into());
    }

    /// Append a batch of records under a single lock.
    ///
    /// When the batch alone exceeds the capacity, only its last
    /// `capacity` elements survive.
    pub fn extend<I>(&self, records: I)
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let mut inner = self.inner.lock();
        for record in records {
            Self::push_locked(&mut inner, self.capacity, record.into());
        }
    }

    fn push_locked(inner: &mut VecDeque<String>, capacity: usize, record: String) {
        if capacity > 0 {
            while inner.len() >= capacity {
                inner.pop_front();
            }
        }
        inner.push_back(record);
    }

    /// Copy of the current contents, oldest first.
    pub fn snapshot(&self) -> Vec<String> {
        self.inner.lock().iter().cloned().collect()
    }

    /// Empty the buffer.
    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    /// Number of records currently buffered.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// `true` when no records are buffered.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Configured capacity (`0` = unbounded).
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evicts_oldest_when_full() {
        let buffer = RecordBuffer::new(3);
        for record in ["a", "b", "c", "d"] {
            buffer.push(record);
        }
        assert_eq!(buffer.snapshot(), vec!["b", "c", "d"]);
    }

    #[test]
    fn test_keeps_last_capacity_items_in_order() {
        let buffer = RecordBuffer::new(5);
        for i in 0..20 {
            buffer.push(format!("rec-{i}"));
        }
        assert_eq!(buffer.len(), 5);
        let expected: Vec<String> = (15..20).map(|i| format!("rec-{i}")).collect();
        assert_eq!(buffer.snapshot(), expected);
    }

    #[test]
    fn test_zero_capacity_is_unbounded() {
        let buffer = RecordBuffer::new(0);
        for i in 0..100 {
            buffer.push(i.to_string());
        }
        assert_eq!(buffer.len(), 100);
    }

    #[test]
    fn test_clear_leaves_empty_buffer() {
        let buffer = RecordBuffer::new(4);
        buffer.push("x");
        buffer.push("y");
        buffer.clear();
        assert!(buffer.is_empty());
        assert!(buffer.snapshot().is_empty());
    }

    #[test]
    fn test_extend_batch_longer_than_capacity() {
        let buffer = RecordBuffer::new(3);
        buffer.push("old");
        buffer.extend(["1", "2", "3", "4", "5"]);
        assert_eq!(buffer.snapshot(), vec!["3", "4", "5"]);
    }

    #[test]
    fn test_clones_share_storage() {
        let buffer = RecordBuffer::new(0);
        let view = buffer.clone();
        buffer.push("shared");
        assert_eq!(view.snapshot(), vec!["shared"]);
    }

    #[test]
    fn test_concurrent_push_respects_capacity() {
        let buffer = RecordBuffer::new(10);
        let mut joins = Vec::new();
        for t in 0..4 {
            let buffer = buffer.clone();
            joins.push(std::thread::spawn(move || {
                for i in 0..50 {
                    buffer.push(format!("{t}-{i}"));
                }
            }));
        }
        for join in joins {
            join.join().unwrap();
        }
        assert_eq!(buffer.len(), 10);
    }
}
