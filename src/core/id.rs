/*!
 * Identity Generation
 * Opaque owner identities for sessions, with a process-wide generator
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

// ============================================================================
// Type-Safe Identity Wrapper
// ============================================================================

/// Opaque identity naming an execution context
///
/// Identities are handed out by a process-wide counter and never reused.
/// Each thread lazily receives one on first call to [`Identity::current`]
/// and keeps it for its whole lifetime. Identities not bound to any thread
/// can be minted with [`Identity::fresh`], which is how work that migrates
/// between threads claims a session under a stable name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(u64);

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ============================================================================
// Generator
// ============================================================================

/// Monotonic identity generator
///
/// # Performance
/// - Cache-line aligned to prevent false sharing
/// - Lock-free atomic increment
#[repr(C, align(64))]
struct IdentityGenerator {
    counter: AtomicU64,
}

impl IdentityGenerator {
    const fn new(start: u64) -> Self {
        Self {
            counter: AtomicU64::new(start),
        }
    }

    #[inline]
    fn next(&self) -> Identity {
        Identity(self.counter.fetch_add(1, Ordering::Relaxed))
    }
}

static GENERATOR: IdentityGenerator = IdentityGenerator::new(1);

thread_local! {
    static CURRENT: Identity = GENERATOR.next();
}

impl Identity {
    /// Identity of the calling thread, stable for the thread's lifetime
    #[inline]
    pub fn current() -> Self {
        CURRENT.with(|id| *id)
    }

    /// A new identity that no thread owns
    #[inline]
    pub fn fresh() -> Self {
        GENERATOR.next()
    }

    /// Wrap a raw value (tests and diagnostics)
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn as_raw(&self) -> u64 {
        self.0
    }
}
