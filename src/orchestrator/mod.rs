/*!
 * Resource Orchestrator
 *
 * Priority-aware admission control for a single shared resource.
 *
 * # Algorithm
 *
 * - `claim_resource(category)` first tries to start the session for the
 *   calling thread in one atomic step. If someone else holds it, the
 *   caller's identity is queued under `category` and the caller blocks
 *   until the session is handed to it.
 * - A coordinator thread wakes on every enqueue and every time the session
 *   becomes free (through `release_resource`, a guard, or [`ExclusiveSession`]
 *   directly) and hands it to the queued identity with the lowest
 *   `(rank, sequence)`.
 * - `release_resource()` ends the session (only the owner may); the session
 *   itself wakes the coordinator.
 *
 * # Limitations
 *
 * Claims block without timeout and cannot be cancelled. Claims made after
 * [`ResourceOrchestrator::shutdown`] that find the resource held never
 * complete.
 */

mod config;
mod coordinator;
mod guard;

pub use config::{OrchestratorConfig, DEFAULT_COORDINATOR_NAME};
pub use guard::ResourceGuard;

use crate::core::errors::{OrchestratorResult, SessionResult};
use crate::core::id::Identity;
use crate::core::sync::ExclusiveSession;
use crate::queue::OrderedQueue;
use coordinator::Coordinator;
use std::sync::Arc;
use tracing::debug;

/// Categories that carry their own priority list
///
/// Earlier entries are served first; categories missing from the list are
/// served after all listed ones.
pub trait Prioritised: Sized {
    fn prioritised() -> Vec<Self>;
}

/// State shared with the coordinator thread
pub(crate) struct Shared<C> {
    queue: OrderedQueue<C, Identity>,
    session: ExclusiveSession,
}

impl<C: PartialEq> Shared<C> {
    /// Hand a free session to the next queued identity
    fn grant_next(&self) -> Option<Identity> {
        self.session.grant_next(|| self.queue.dequeue().ok())
    }
}

/// Priority-respecting exclusive access to one resource
///
/// # Example
///
/// ```
/// use resource_orchestrator::{Prioritised, ResourceOrchestrator};
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// enum Consumer {
///     Interactive,
///     Batch,
///     Any,
/// }
///
/// impl Prioritised for Consumer {
///     fn prioritised() -> Vec<Self> {
///         vec![Consumer::Interactive, Consumer::Batch]
///     }
/// }
///
/// let resource = ResourceOrchestrator::<Consumer>::new().unwrap();
/// resource.claim_resource(Consumer::Any);
/// // ... exclusive work ...
/// resource.release_resource().unwrap();
///
/// let guard = resource.claim(Consumer::Batch);
/// assert_eq!(resource.holder(), Some(guard.owner()));
/// ```
pub struct ResourceOrchestrator<C>
where
    C: PartialEq + Send + Sync + 'static,
{
    shared: Arc<Shared<C>>,
    coordinator: Coordinator,
}

impl<C> ResourceOrchestrator<C>
where
    C: Prioritised + PartialEq + Send + Sync + 'static,
{
    /// Create an orchestrator ranking categories by [`Prioritised::prioritised`]
    pub fn new() -> OrchestratorResult<Self> {
        Self::with_priorities(C::prioritised())
    }
}

impl<C> ResourceOrchestrator<C>
where
    C: PartialEq + Send + Sync + 'static,
{
    /// Create an orchestrator with an explicit priority list
    pub fn with_priorities(prioritised: Vec<C>) -> OrchestratorResult<Self> {
        Self::with_config(prioritised, OrchestratorConfig::default())
    }

    /// Create an orchestrator with an explicit priority list and configuration
    ///
    /// Returns once the coordinator thread is running.
    pub fn with_config(prioritised: Vec<C>, config: OrchestratorConfig) -> OrchestratorResult<Self> {
        let shared = Arc::new(Shared {
            queue: OrderedQueue::new(prioritised),
            session: ExclusiveSession::new(),
        });
        let coordinator = Coordinator::spawn(shared.clone(), &config)?;

        Ok(Self {
            shared,
            coordinator,
        })
    }

    /// Block until the calling thread holds the resource
    pub fn claim_resource(&self, category: C) {
        let claimant = Identity::current();

        if self.shared.session.try_begin_session(Some(claimant)) {
            debug!(claimant = %claimant, "resource claimed without queueing");
            return;
        }

        let event = self.shared.queue.enqueue(category, claimant);
        debug!(
            claimant = %claimant,
            rank = %event.rank,
            sequence = event.sequence,
            "resource busy, claim queued"
        );
        self.shared.session.await_session_started(claimant);
    }

    /// Claim the resource and release it when the returned guard drops
    pub fn claim(&self, category: C) -> ResourceGuard<'_, C> {
        self.claim_resource(category);
        ResourceGuard::new(self, Identity::current())
    }

    /// Release the resource held by the calling thread
    ///
    /// No-op when nobody holds it. Fails with
    /// [`SessionError::NotOwner`](crate::SessionError::NotOwner) when another
    /// identity does.
    pub fn release_resource(&self) -> SessionResult<()> {
        self.release_for(Identity::current())
    }

    pub(crate) fn release_for(&self, owner: Identity) -> SessionResult<()> {
        self.shared.session.end_session_as(owner)
    }

    /// Identity currently holding the resource
    pub fn holder(&self) -> Option<Identity> {
        self.shared.session.owner()
    }

    /// Number of queued claimants
    pub fn pending(&self) -> usize {
        self.shared.queue.len()
    }

    /// The session backing this orchestrator
    ///
    /// Ending the session here wakes queued claimants just like
    /// [`release_resource`](Self::release_resource).
    pub fn session(&self) -> &ExclusiveSession {
        &self.shared.session
    }

    /// Stop the coordinator thread
    ///
    /// Idempotent; also runs on drop.
    pub fn shutdown(&self) {
        self.coordinator.shutdown();
    }

    pub fn is_running(&self) -> bool {
        self.coordinator.is_running()
    }
}
