/*!
 * Ordered Queue
 *
 * Insertion-order-stable priority queue keyed by a caller-supplied ranking
 * of categories.
 *
 * # Ordering
 *
 * Entries leave the queue by `(rank, sequence)` ascending. `rank` is the
 * category's index in the priority list (unlisted categories rank last) and
 * `sequence` is a counter assigned under the queue lock at enqueue time, so
 * FIFO order within a rank is part of the key rather than a property of the
 * underlying heap.
 *
 * # Notifications
 *
 * Every enqueue publishes an [`Enqueued`] event to subscribers over
 * unbounded channels. Consumers react on their own threads; the enqueuing
 * thread never waits for them.
 */

mod entry;
mod notify;

pub use entry::Rank;
pub use notify::Enqueued;

use crate::core::errors::{QueueError, QueueResult};
use entry::Entry;
use notify::Subscribers;
use parking_lot::Mutex;
use std::collections::BinaryHeap;
use std::thread;
use tracing::{debug, trace};

struct Inner<C, I> {
    heap: BinaryHeap<Entry<C, I>>,
    next_sequence: u64,
}

/// Stable priority queue
///
/// # Example
///
/// ```
/// use resource_orchestrator::OrderedQueue;
///
/// let queue = OrderedQueue::new(vec!["urgent", "normal"]);
/// queue.enqueue("normal", 1);
/// queue.enqueue("other", 2);
/// queue.enqueue("urgent", 3);
///
/// assert_eq!(queue.dequeue().unwrap(), 3);
/// assert_eq!(queue.dequeue().unwrap(), 1);
/// assert_eq!(queue.dequeue().unwrap(), 2);
/// assert!(queue.dequeue().is_err());
/// ```
pub struct OrderedQueue<C, I> {
    prioritised: Vec<C>,
    inner: Mutex<Inner<C, I>>,
    subscribers: Subscribers,
}

impl<C: PartialEq, I> OrderedQueue<C, I> {
    /// Create a queue ranking categories by their position in `prioritised`
    pub fn new(prioritised: Vec<C>) -> Self {
        Self {
            prioritised,
            inner: Mutex::new(Inner {
                heap: BinaryHeap::new(),
                next_sequence: 0,
            }),
            subscribers: Subscribers::default(),
        }
    }

    /// Create a plain FIFO queue (no prioritised categories)
    pub fn fifo() -> Self {
        Self::new(Vec::new())
    }

    /// Add `item` under `category`
    pub fn enqueue(&self, category: C, item: I) -> Enqueued {
        let rank = Rank::of(&category, &self.prioritised);

        let event = {
            let mut inner = self.inner.lock();
            let sequence = inner.next_sequence;
            inner.next_sequence += 1;
            inner.heap.push(Entry {
                category,
                rank,
                sequence,
                item,
            });
            Enqueued { rank, sequence }
        };

        trace!(rank = %rank, sequence = event.sequence, "item enqueued");
        self.subscribers.publish(event);
        event
    }

    /// Remove the entry with the lowest `(rank, sequence)`
    pub fn dequeue(&self) -> QueueResult<I> {
        self.dequeue_with_category().map(|(_, item)| item)
    }

    /// Like [`dequeue`](Self::dequeue) but also returns the entry's category
    pub fn dequeue_with_category(&self) -> QueueResult<(C, I)> {
        let entry = self.inner.lock().heap.pop().ok_or(QueueError::Empty)?;
        trace!(rank = %entry.rank, sequence = entry.sequence, "item dequeued");
        Ok((entry.category, entry.item))
    }

    /// Point-in-time emptiness check
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().heap.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.lock().heap.len()
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.count()
    }

    /// The priority list this queue was built with
    pub fn prioritised(&self) -> &[C] {
        &self.prioritised
    }

    /// Receive an [`Enqueued`] event for every subsequent enqueue
    ///
    /// The channel closes when the queue is dropped.
    pub fn subscribe(&self) -> flume::Receiver<Enqueued> {
        self.subscribers.subscribe()
    }

    /// Run `callback` for every subsequent enqueue on a dedicated dispatcher thread
    ///
    /// The dispatcher exits once the queue is dropped.
    pub fn on_enqueued<F>(&self, callback: F) -> QueueResult<()>
    where
        F: Fn(Enqueued) + Send + 'static,
    {
        let events = self.subscribe();
        thread::Builder::new()
            .name("queue-notify".into())
            .spawn(move || {
                for event in events.iter() {
                    callback(event);
                }
                debug!("enqueue dispatcher stopped");
            })
            .map(|_| ())
            .map_err(|e| QueueError::Notifier(e.to_string()))
    }
}
