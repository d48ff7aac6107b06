/*!
 * Core Module
 * Identities, error types and synchronization primitives
 */

pub mod errors;
pub mod id;
pub mod sync;

// Re-export for convenience
pub use errors::*;
pub use id::Identity;
pub use sync::{Exclusive, ExclusiveSession, SessionScope, ValueCell};
