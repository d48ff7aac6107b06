/*!
 * Enqueue Notifications
 * Fan-out of "item enqueued" events to subscribers over unbounded channels
 */

use super::entry::Rank;
use parking_lot::Mutex;
use tracing::trace;

/// Emitted once per successful enqueue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Enqueued {
    pub rank: Rank,
    pub sequence: u64,
}

/// Subscriber registry
///
/// Sends never block: every channel is unbounded, so however slow a
/// subscriber is, the enqueuing thread only pays for the channel push.
#[derive(Default)]
pub(super) struct Subscribers {
    senders: Mutex<Vec<flume::Sender<Enqueued>>>,
}

impl Subscribers {
    pub fn subscribe(&self) -> flume::Receiver<Enqueued> {
        let (tx, rx) = flume::unbounded();
        self.senders.lock().push(tx);
        rx
    }

    /// Deliver `event` to every live subscriber, dropping disconnected ones
    pub fn publish(&self, event: Enqueued) -> usize {
        let mut senders = self.senders.lock();
        senders.retain(|tx| tx.send(event).is_ok());
        trace!(
            rank = %event.rank,
            sequence = event.sequence,
            subscribers = senders.len(),
            "enqueue published"
        );
        senders.len()
    }

    pub fn count(&self) -> usize {
        self.senders.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disconnected_subscribers_are_pruned() {
        let subscribers = Subscribers::default();
        let kept = subscribers.subscribe();
        drop(subscribers.subscribe());
        assert_eq!(subscribers.count(), 2);

        let event = Enqueued {
            rank: Rank::Listed(0),
            sequence: 0,
        };
        assert_eq!(subscribers.publish(event), 1);
        assert_eq!(kept.try_recv().unwrap(), event);
    }
}
