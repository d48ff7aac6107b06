/*!
 * Ordered Queue Integration Tests
 */

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use resource_orchestrator::{OrderedQueue, QueueError, Rank};
use std::sync::Arc;
use std::thread;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Key {
    A,
    B,
    C,
    Unlisted,
}

#[test]
fn test_priority_and_arrival_order() {
    let queue = OrderedQueue::new(vec![Key::A, Key::B, Key::C]);
    let arrivals = [
        Key::B,
        Key::C,
        Key::A,
        Key::Unlisted,
        Key::A,
        Key::C,
        Key::B,
        Key::A,
    ];
    for (i, key) in arrivals.iter().enumerate() {
        queue.enqueue(*key, (*key, i));
    }

    let drained: Vec<(Key, usize)> = std::iter::from_fn(|| queue.dequeue().ok()).collect();
    assert_eq!(
        drained,
        vec![
            (Key::A, 2),
            (Key::A, 4),
            (Key::A, 7),
            (Key::B, 0),
            (Key::B, 6),
            (Key::C, 1),
            (Key::C, 5),
            (Key::Unlisted, 3),
        ]
    );
}

#[test]
fn test_empty_dequeue_fails_without_blocking() {
    let queue: OrderedQueue<Key, u32> = OrderedQueue::new(vec![Key::A]);
    for _ in 0..3 {
        assert_eq!(queue.dequeue(), Err(QueueError::Empty));
    }
}

#[test]
fn test_concurrent_producers_keep_per_producer_fifo() {
    let queue = Arc::new(OrderedQueue::new(vec![0u8, 1]));
    let producers: Vec<_> = (0..4u8)
        .map(|producer| {
            let queue = queue.clone();
            thread::spawn(move || {
                for n in 0..250u32 {
                    queue.enqueue(producer % 3, (producer, n));
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().unwrap();
    }

    assert_eq!(queue.len(), 1000);
    let mut last_seen = [None::<u32>; 4];
    let mut last_rank = Rank::Listed(0);
    while let Ok((category, (producer, n))) = queue.dequeue_with_category() {
        let rank = Rank::of(&category, queue.prioritised());
        assert!(rank >= last_rank);
        last_rank = rank;

        let slot = &mut last_seen[producer as usize];
        assert!(slot.map_or(true, |prev| prev < n));
        *slot = Some(n);
    }
    assert!(queue.is_empty());
}

fn arb_key() -> impl Strategy<Value = Key> {
    prop_oneof![
        Just(Key::A),
        Just(Key::B),
        Just(Key::C),
        Just(Key::Unlisted),
    ]
}

proptest! {
    #[test]
    fn prop_dequeue_order_is_rank_then_arrival(keys in prop::collection::vec(arb_key(), 0..64)) {
        let prioritised = vec![Key::A, Key::B, Key::C];
        let queue = OrderedQueue::new(prioritised.clone());
        for (i, key) in keys.iter().enumerate() {
            queue.enqueue(*key, i);
        }

        let mut expected: Vec<usize> = (0..keys.len()).collect();
        expected.sort_by_key(|&i| (Rank::of(&keys[i], &prioritised), i));

        let drained: Vec<usize> = std::iter::from_fn(|| queue.dequeue().ok()).collect();
        prop_assert_eq!(drained, expected);
    }
}
