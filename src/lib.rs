/*!
 * Resource Orchestrator
 *
 * Composable concurrency primitives for serializing access to a shared
 * resource with priority-aware fairness:
 *
 * - [`ValueCell`]: thread-safe value with blocking wait-for-value
 * - [`OrderedQueue`]: insertion-order-stable priority queue
 * - [`ExclusiveSession`]: ownership-checked, hand-off-capable mutex
 * - [`ResourceOrchestrator`]: priority-ordered admission to one resource
 */

pub mod core;
pub mod monitoring;
pub mod orchestrator;
pub mod queue;

// Re-exports
pub use crate::core::errors::*;
pub use crate::core::{Exclusive, ExclusiveSession, Identity, SessionScope, ValueCell};
pub use monitoring::init_tracing;
pub use orchestrator::{OrchestratorConfig, Prioritised, ResourceGuard, ResourceOrchestrator};
pub use queue::{Enqueued, OrderedQueue, Rank};
