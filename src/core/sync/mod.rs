/*!
 * Synchronization Primitives
 *
 * Blocking building blocks for serializing access to a shared resource:
 * - `ValueCell`: lock-protected value with broadcast wait-for-value
 * - `ExclusiveSession`: ownership-checked mutex with hand-off to other identities
 * - `Exclusive`: decorator running every call to a service inside a session
 *
 * # Blocking
 *
 * Every wait suspends the thread on a `parking_lot::Condvar` and is woken
 * by `notify_all`; nothing spins. Waits have no timeout and no cancellation.
 */

mod exclusive;
mod session;
mod value_cell;

pub use exclusive::Exclusive;
pub use session::{ExclusiveSession, SessionScope};
pub use value_cell::ValueCell;
