/*!
 * Resource Guard
 * Scoped claim that releases the resource when dropped
 */

use super::ResourceOrchestrator;
use crate::core::errors::SessionResult;
use crate::core::id::Identity;
use tracing::warn;

/// RAII claim on an orchestrated resource
///
/// Returned by [`ResourceOrchestrator::claim`]. Releases on drop; call
/// [`release`](Self::release) to observe the result instead.
#[must_use = "the resource is released as soon as the guard is dropped"]
pub struct ResourceGuard<'a, C>
where
    C: PartialEq + Send + Sync + 'static,
{
    orchestrator: &'a ResourceOrchestrator<C>,
    owner: Identity,
    released: bool,
}

impl<'a, C> ResourceGuard<'a, C>
where
    C: PartialEq + Send + Sync + 'static,
{
    pub(super) fn new(orchestrator: &'a ResourceOrchestrator<C>, owner: Identity) -> Self {
        Self {
            orchestrator,
            owner,
            released: false,
        }
    }

    /// Identity holding the resource through this guard
    pub fn owner(&self) -> Identity {
        self.owner
    }

    /// Release now and report ownership violations
    pub fn release(mut self) -> SessionResult<()> {
        self.released = true;
        self.orchestrator.release_for(self.owner)
    }
}

impl<C> Drop for ResourceGuard<'_, C>
where
    C: PartialEq + Send + Sync + 'static,
{
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(err) = self.orchestrator.release_for(self.owner) {
            warn!(error = %err, "resource guard dropped after ownership changed");
        }
    }
}
