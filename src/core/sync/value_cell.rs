/*!
 * Value Cell
 *
 * Lock-protected value with broadcast wait-for-value semantics.
 * Built on parking_lot::Mutex + Condvar: every write wakes every waiter,
 * each of which re-checks its own condition under the lock.
 */

use crate::core::errors::{ConfigResult, ConfigurationError};
use parking_lot::{Condvar, Mutex};
use std::any::type_name;
use std::time::{Duration, Instant};
use tracing::trace;

/// Thread-safe value wrapper with blocking waits on its value
///
/// # Guarantees
///
/// - Reads and writes are mutually exclusive
/// - A write is visible to every waiter before the writer returns
/// - Notification is broadcast (`notify_all`), so any number of waiters on
///   the same or different targets are released by the write that satisfies them
///
/// # Examples
///
/// ```
/// use resource_orchestrator::ValueCell;
/// use std::sync::Arc;
/// use std::thread;
///
/// let cell = Arc::new(ValueCell::new(0u32).unwrap());
/// let waiter = {
///     let cell = cell.clone();
///     thread::spawn(move || cell.wait_for_value(&3))
/// };
///
/// cell.set(3);
/// waiter.join().unwrap();
/// ```
#[derive(Debug)]
pub struct ValueCell<T> {
    value: Mutex<T>,
    changed: Condvar,
}

impl<T> ValueCell<T> {
    /// Create a cell holding `initial`
    ///
    /// Fails with [`ConfigurationError`] when `T` is itself a `ValueCell`.
    pub fn new(initial: T) -> ConfigResult<Self> {
        reject_nested::<T>()?;
        Ok(Self::with_value(initial))
    }

    /// Create a cell for a type already known not to be a `ValueCell`
    pub(crate) const fn with_value(initial: T) -> Self {
        Self {
            value: Mutex::new(initial),
            changed: Condvar::new(),
        }
    }

    /// Create a cell holding `T::default()`
    pub fn try_default() -> ConfigResult<Self>
    where
        T: Default,
    {
        Self::new(T::default())
    }

    /// Snapshot of the current value
    #[inline]
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.value.lock().clone()
    }

    /// Read the current value in place
    #[inline]
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.lock())
    }

    /// Replace the value and wake every waiter
    pub fn set(&self, value: T) {
        let mut guard = self.value.lock();
        *guard = value;
        self.changed.notify_all();
        trace!(cell = type_name::<T>(), "value set");
    }

    /// Atomically modify the value and wake every waiter
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.value.lock();
        let result = f(&mut guard);
        self.changed.notify_all();
        result
    }

    /// Block until `predicate` holds for the current value
    ///
    /// Returns immediately if it already holds. No timeout.
    pub fn wait_until(&self, mut predicate: impl FnMut(&T) -> bool) {
        let mut guard = self.value.lock();
        while !predicate(&guard) {
            self.changed.wait(&mut guard);
        }
    }

    /// Block until `predicate` holds, then modify the value under the same lock
    ///
    /// The check and the write form a single transition: no other writer can
    /// run between them.
    pub fn wait_then_update<R>(
        &self,
        mut predicate: impl FnMut(&T) -> bool,
        f: impl FnOnce(&mut T) -> R,
    ) -> R {
        let mut guard = self.value.lock();
        while !predicate(&guard) {
            self.changed.wait(&mut guard);
        }
        let result = f(&mut guard);
        self.changed.notify_all();
        result
    }

    /// Block until the value equals `target`
    #[inline]
    pub fn wait_for_value(&self, target: &T)
    where
        T: PartialEq,
    {
        self.wait_until(|value| value == target);
    }

    /// Like [`wait_for_value`](Self::wait_for_value) but gives up after `timeout`
    ///
    /// Returns `true` if the value was reached.
    pub fn wait_for_value_timeout(&self, target: &T, timeout: Duration) -> bool
    where
        T: PartialEq,
    {
        let deadline = Instant::now() + timeout;
        let mut guard = self.value.lock();
        while *guard != *target {
            if self.changed.wait_until(&mut guard, deadline).timed_out() {
                return *guard == *target;
            }
        }
        true
    }
}

/// Refuse `ValueCell<ValueCell<_>>`
fn reject_nested<T>() -> ConfigResult<()> {
    let own = type_name::<ValueCell<()>>();
    let prefix = own.strip_suffix("<()>").unwrap_or(own);
    let candidate = type_name::<T>();

    match candidate.strip_prefix(prefix) {
        Some(rest) if rest.starts_with('<') => Err(ConfigurationError(format!(
            "ValueCell cannot hold another ValueCell (got {})",
            candidate
        ))),
        _ => Ok(()),
    }
}
