use crate::sensor_interface::QueuedLine;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Default bound on queued lines before the oldest is discarded.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Bounded FIFO between the source reader and the tick loop.
///
/// `push` never waits on the consumer: once the queue holds `capacity`
/// lines the oldest one is discarded to make room. Clones share the same
/// underlying queue.
#[derive(Clone)]
pub struct IngestQueue {
    shared: Arc<Shared>,
}

struct Shared {
    lines: Mutex<VecDeque<QueuedLine>>,
    capacity: usize,
    dropped: AtomicU64,
}

impl IngestQueue {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            shared: Arc::new(Shared {
                lines: Mutex::new(VecDeque::with_capacity(capacity.min(DEFAULT_QUEUE_CAPACITY))),
                capacity,
                dropped: AtomicU64::new(0),
            }),
        }
    }

    /// Appends a line, discarding the oldest queued line when full.
    ///
    /// Returns `true` if a line had to be discarded.
    pub fn push(&self, line: QueuedLine) -> bool {
        let mut lines = self.lock();
        let mut dropped = false;
        while lines.len() >= self.shared.capacity {
            lines.pop_front();
            dropped = true;
        }
        lines.push_back(line);
        drop(lines);

        if dropped {
            self.shared.dropped.fetch_add(1, Ordering::Relaxed);
        }
        dropped
    }

    /// Removes and returns everything queued, oldest first.
    pub fn drain_all(&self) -> Vec<QueuedLine> {
        let mut lines = self.lock();
        if lines.is_empty() {
            return Vec::new();
        }
        lines.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// Total lines discarded by the drop-oldest policy.
    pub fn dropped_count(&self) -> u64 {
        self.shared.dropped.load(Ordering::Relaxed)
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<QueuedLine>> {
        // A panic while holding the lock cannot leave the deque half-updated.
        match self.shared.lines.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for IngestQueue {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn line(text: &str) -> QueuedLine {
        QueuedLine::new(text, 0.0)
    }

    #[test]
    fn drains_in_fifo_order() {
        let queue = IngestQueue::with_capacity(8);
        queue.push(line("a"));
        queue.push(line("b"));
        queue.push(line("c"));

        let drained: Vec<String> = queue.drain_all().into_iter().map(|l| l.text).collect();
        assert_eq!(drained, vec!["a", "b", "c"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn draining_empty_queue_is_idempotent() {
        let queue = IngestQueue::default();
        assert!(queue.drain_all().is_empty());
        assert!(queue.drain_all().is_empty());
        assert_eq!(queue.len(), 0);
        assert_eq!(queue.dropped_count(), 0);
    }

    #[test]
    fn full_queue_drops_oldest() {
        let queue = IngestQueue::with_capacity(2);
        assert!(!queue.push(line("a")));
        assert!(!queue.push(line("b")));
        assert!(queue.push(line("c")));

        let drained: Vec<String> = queue.drain_all().into_iter().map(|l| l.text).collect();
        assert_eq!(drained, vec!["b", "c"]);
        assert_eq!(queue.dropped_count(), 1);
    }

    #[test]
    fn zero_capacity_is_normalised() {
        let queue = IngestQueue::with_capacity(0);
        assert_eq!(queue.capacity(), 1);
        queue.push(line("a"));
        queue.push(line("b"));
        assert_eq!(queue.drain_all(), vec![line("b")]);
    }

    #[test]
    fn producer_and_consumer_run_concurrently() {
        let queue = IngestQueue::with_capacity(10_000);
        let producer = queue.clone();
        let handle = thread::spawn(move || {
            for index in 0..1_000 {
                producer.push(QueuedLine::new(index.to_string(), index as f64));
            }
        });

        let mut received = Vec::new();
        while received.len() < 1_000 {
            received.extend(queue.drain_all());
            thread::yield_now();
        }
        handle.join().unwrap();

        let order: Vec<usize> = received.iter().map(|l| l.text.parse().unwrap()).collect();
        assert_eq!(order, (0..1_000).collect::<Vec<_>>());
    }
}
