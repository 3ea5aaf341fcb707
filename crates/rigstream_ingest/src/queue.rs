//! # Ingestion Queues
//!
//! Three independent FIFO queues (errors, bounds, frames), each behind its
//! own lock. The bridge is the only producer, the scheduler the only
//! consumer.
//!
//! ```text
//! producer thread                     tick thread
//!   enqueue ──lock──> [ VecDeque ] ──lock──> drain_up_to(n)
//!                                   <──lock── restore_front / requeue
//! ```
//!
//! Locks are held for the queue operation only. Drained items are returned
//! by value so assembly runs with no lock held.

use std::collections::VecDeque;

use parking_lot::Mutex;
use rigstream_shared::{BoundsRecord, ErrorRecord, FrameRecord};

/// A lock-protected FIFO queue.
#[derive(Debug)]
pub struct IngestQueue<T> {
    name: &'static str,
    items: Mutex<VecDeque<T>>,
}

impl<T> IngestQueue<T> {
    /// Creates an empty queue. `name` is used in diagnostics.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            items: Mutex::new(VecDeque::new()),
        }
    }

    /// Queue name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Appends an item at the tail. Never blocks on consumer progress.
    pub fn enqueue(&self, item: T) {
        self.items.lock().push_back(item);
    }

    /// Removes and returns up to `max` items from the head, in FIFO order.
    #[must_use]
    pub fn drain_up_to(&self, max: usize) -> Vec<T> {
        let mut items = self.items.lock();
        let n = max.min(items.len());
        items.drain(..n).collect()
    }

    /// Puts an item back at the tail.
    pub fn requeue(&self, item: T) {
        self.enqueue(item);
    }

    /// Puts previously drained items back at the head, keeping their order.
    pub fn restore_front<I>(&self, drained: I)
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: DoubleEndedIterator,
    {
        let mut items = self.items.lock();
        for item in drained.into_iter().rev() {
            items.push_front(item);
        }
    }

    /// Number of queued items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// Whether the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Discards everything queued. Returns how many items were dropped.
    pub fn clear(&self) -> usize {
        let mut items = self.items.lock();
        let n = items.len();
        items.clear();
        n
    }
}

/// The three queues fed by one bridge.
#[derive(Debug)]
pub struct IngestQueues {
    /// Per-character error records.
    pub errors: IngestQueue<ErrorRecord>,
    /// Bounds announcements.
    pub bounds: IngestQueue<BoundsRecord>,
    /// Pose frames.
    pub frames: IngestQueue<FrameRecord>,
}

impl IngestQueues {
    /// Creates three empty queues.
    #[must_use]
    pub fn new() -> Self {
        Self {
            errors: IngestQueue::new("errors"),
            bounds: IngestQueue::new("bounds"),
            frames: IngestQueue::new("frames"),
        }
    }

    /// Whether all three queues are empty.
    #[must_use]
    pub fn all_empty(&self) -> bool {
        self.errors.is_empty() && self.bounds.is_empty() && self.frames.is_empty()
    }

    /// Drops everything queued. Returns the total number discarded.
    pub fn clear(&self) -> usize {
        self.errors.clear() + self.bounds.clear() + self.frames.clear()
    }
}

impl Default for IngestQueues {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_drain_respects_budget_and_order() {
        let q = IngestQueue::new("test");
        for i in 0..10 {
            q.enqueue(i);
        }
        assert_eq!(q.drain_up_to(3), vec![0, 1, 2]);
        assert_eq!(q.len(), 7);
        assert_eq!(q.drain_up_to(usize::MAX), vec![3, 4, 5, 6, 7, 8, 9]);
        assert!(q.is_empty());
    }

    #[test]
    fn test_drain_empty_queue() {
        let q: IngestQueue<u32> = IngestQueue::new("test");
        assert!(q.drain_up_to(5).is_empty());
    }

    #[test]
    fn test_restore_front_preserves_order() {
        let q = IngestQueue::new("test");
        for i in 0..5 {
            q.enqueue(i);
        }
        let mut batch = q.drain_up_to(3).into_iter();
        let first = batch.next().unwrap();
        q.restore_front(batch);
        q.requeue(first);
        assert_eq!(q.drain_up_to(usize::MAX), vec![1, 2, 3, 4, 0]);
    }

    #[test]
    fn test_clear_reports_count() {
        let q = IngestQueue::new("test");
        q.enqueue(1);
        q.enqueue(2);
        assert_eq!(q.clear(), 2);
        assert!(q.is_empty());
    }

    #[test]
    fn test_concurrent_producers_lose_nothing() {
        let q = Arc::new(IngestQueue::new("test"));
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let q = Arc::clone(&q);
                thread::spawn(move || {
                    for i in 0..1000 {
                        q.enqueue(t * 1000 + i);
                    }
                })
            })
            .collect();

        let mut drained = Vec::new();
        for h in handles {
            h.join().unwrap();
        }
        drained.extend(q.drain_up_to(usize::MAX));
        assert_eq!(drained.len(), 4000);

        // Per-producer order is preserved.
        for t in 0..4 {
            let mine: Vec<_> = drained.iter().filter(|v| **v / 1000 == t).copied().collect();
            assert!(mine.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
