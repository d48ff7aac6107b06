/*!
 * Queue Entry Types
 * Ordering key for the ordered queue: rank first, then arrival sequence
 */

use std::cmp::Ordering;
use std::fmt;

/// Priority position of a category (lower is served first)
///
/// Listed categories rank by their index in the priority list; every
/// unlisted category shares the `Unlisted` rank, which sorts after all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rank {
    Listed(usize),
    Unlisted,
}

impl Rank {
    /// Rank of `category` within `prioritised`
    pub fn of<C: PartialEq>(category: &C, prioritised: &[C]) -> Self {
        prioritised
            .iter()
            .position(|candidate| candidate == category)
            .map_or(Rank::Unlisted, Rank::Listed)
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rank::Listed(index) => write!(f, "{}", index),
            Rank::Unlisted => write!(f, "unlisted"),
        }
    }
}

/// Queued item with its ordering key
#[derive(Debug)]
pub(super) struct Entry<C, I> {
    pub category: C,
    pub rank: Rank,
    pub sequence: u64,
    pub item: I,
}

impl<C, I> Entry<C, I> {
    #[inline]
    fn key(&self) -> (Rank, u64) {
        (self.rank, self.sequence)
    }
}

impl<C, I> PartialEq for Entry<C, I> {
    fn eq(&self, other: &Self) -> bool {
        self.sequence == other.sequence
    }
}

impl<C, I> Eq for Entry<C, I> {}

impl<C, I> Ord for Entry<C, I> {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap, so the lowest (rank, sequence) must compare greatest
        other.key().cmp(&self.key())
    }
}

impl<C, I> PartialOrd for Entry<C, I> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
