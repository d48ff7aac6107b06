/*!
 * Exclusive Session
 *
 * Ownership-checked mutual exclusion with explicit owner identities.
 *
 * # States
 *
 * - `Free`: no owner
 * - `Held(owner)`: owned by exactly one [`Identity`]
 *
 * The owner does not have to be the thread that started the session:
 * [`ExclusiveSession::begin_session_as`] grants ownership to another
 * identity, which is how a coordinator hands the session to a blocked
 * claimant.
 *
 * Every `Held -> Free` transition is published to the subscribers returned by
 * [`ExclusiveSession::subscribe_ended`], whichever path ended the session.
 */

use crate::core::errors::{SessionError, SessionResult};
use crate::core::id::Identity;
use crate::core::sync::ValueCell;
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

/// Mutual-exclusion session with hand-off support
///
/// All blocking operations wait on the broadcast [`ValueCell`] holding the
/// owner, so any number of threads may wait for the same transition.
///
/// # Example
///
/// ```
/// use resource_orchestrator::ExclusiveSession;
///
/// let session = ExclusiveSession::new();
/// session.begin_session();
/// assert!(session.has_session());
/// session.end_session().unwrap();
/// assert!(!session.has_session());
/// ```
#[derive(Debug)]
pub struct ExclusiveSession {
    /// Only one begin transition runs at a time
    admission: Mutex<()>,
    owner: ValueCell<Option<Identity>>,
    /// Notified with the previous owner whenever the session becomes free
    ended: Mutex<Vec<flume::Sender<Identity>>>,
}

impl ExclusiveSession {
    pub const fn new() -> Self {
        Self {
            admission: Mutex::new(()),
            owner: ValueCell::with_value(None),
            ended: Mutex::new(Vec::new()),
        }
    }

    /// Claim the session for the calling thread, blocking while another identity holds it
    pub fn begin_session(&self) {
        self.begin(None);
    }

    /// Claim the session on behalf of `owner`, blocking while another identity holds it
    ///
    /// Succeeds immediately if the session is free or already held by `owner`
    /// or by the caller.
    pub fn begin_session_as(&self, owner: Identity) {
        self.begin(Some(owner));
    }

    /// Returns `false` when `target` already held the session
    fn begin(&self, owner: Option<Identity>) -> bool {
        let caller = Identity::current();
        let target = owner.unwrap_or(caller);

        let _admission = self.admission.lock();
        let started = self.owner.wait_then_update(
            |current| admits(*current, target, caller),
            |current| {
                let started = *current != Some(target);
                *current = Some(target);
                started
            },
        );
        if started {
            debug!(owner = %target, caller = %caller, "session started");
        }
        started
    }

    /// Claim the session only if that can happen without waiting
    ///
    /// Returns `true` when `owner` (or the caller) now holds the session.
    pub fn try_begin_session(&self, owner: Option<Identity>) -> bool {
        let caller = Identity::current();
        let target = owner.unwrap_or(caller);

        let _admission = self.admission.lock();
        let started = self.owner.update(|current| {
            if admits(*current, target, caller) {
                *current = Some(target);
                true
            } else {
                false
            }
        });

        if started {
            debug!(owner = %target, caller = %caller, "session started without contention");
        }
        started
    }

    /// Hand a free session to the identity produced by `next`
    ///
    /// `next` is only invoked when the session is free, and the grant happens
    /// in the same transition as the check. Returns the new owner, or `None`
    /// if the session was held or `next` had nobody to offer.
    pub fn grant_next(&self, next: impl FnOnce() -> Option<Identity>) -> Option<Identity> {
        let _admission = self.admission.lock();
        let granted = self.owner.update(|current| {
            if current.is_some() {
                return None;
            }
            let identity = next()?;
            *current = Some(identity);
            Some(identity)
        });

        if let Some(owner) = granted {
            debug!(owner = %owner, "session handed off");
        }
        granted
    }

    /// End the calling thread's session
    ///
    /// No-op when the session is free. Fails with [`SessionError::NotOwner`]
    /// when another identity holds it.
    pub fn end_session(&self) -> SessionResult<()> {
        self.end_session_as(Identity::current())
    }

    /// End the session held by `caller`
    pub fn end_session_as(&self, caller: Identity) -> SessionResult<()> {
        let outcome = self.owner.update(|current| match *current {
            None => Ok(false),
            Some(owner) if owner == caller => {
                *current = None;
                Ok(true)
            }
            Some(owner) => Err(SessionError::NotOwner { owner, caller }),
        });

        match outcome {
            Ok(true) => {
                debug!(owner = %caller, "session ended");
                self.publish_ended(caller);
                Ok(())
            }
            Ok(false) => Ok(()),
            Err(err) => {
                warn!(error = %err, "refused to end session");
                Err(err)
            }
        }
    }

    /// Receive the previous owner every time the session becomes free
    ///
    /// Dropping the receiver unsubscribes.
    pub fn subscribe_ended(&self) -> flume::Receiver<Identity> {
        let (tx, rx) = flume::unbounded();
        self.ended.lock().push(tx);
        rx
    }

    fn publish_ended(&self, owner: Identity) {
        let mut senders = self.ended.lock();
        senders.retain(|tx| tx.send(owner).is_ok());
        trace!(owner = %owner, subscribers = senders.len(), "session end published");
    }

    /// `true` while some identity holds the session
    #[inline]
    pub fn has_session(&self) -> bool {
        self.owner.with(Option::is_some)
    }

    /// Current owner, if any
    #[inline]
    pub fn owner(&self) -> Option<Identity> {
        self.owner.get()
    }

    /// Block until `identity` owns the session
    pub fn await_session_started(&self, identity: Identity) {
        self.owner.wait_for_value(&Some(identity));
    }

    /// Block until the session is free
    pub fn await_session_end(&self) {
        self.owner.wait_for_value(&None);
    }

    /// Begin a session for the calling thread that ends when the scope is dropped
    ///
    /// A scope opened while the calling thread already holds the session
    /// leaves it held on drop, so scopes nest.
    pub fn scope(&self) -> SessionScope<'_> {
        let started = self.begin(None);
        SessionScope {
            session: self,
            owner: Identity::current(),
            started,
        }
    }
}

impl Default for ExclusiveSession {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn admits(current: Option<Identity>, target: Identity, caller: Identity) -> bool {
    match current {
        None => true,
        Some(owner) => owner == target || owner == caller,
    }
}

/// RAII session scope returned by [`ExclusiveSession::scope`]
#[must_use = "the session ends as soon as the scope is dropped"]
pub struct SessionScope<'a> {
    session: &'a ExclusiveSession,
    owner: Identity,
    /// Whether this scope started the session (outermost scope)
    started: bool,
}

impl SessionScope<'_> {
    pub fn owner(&self) -> Identity {
        self.owner
    }
}

impl Drop for SessionScope<'_> {
    fn drop(&mut self) {
        if !self.started {
            return;
        }
        if let Err(err) = self.session.end_session_as(self.owner) {
            warn!(error = %err, "session scope dropped after ownership changed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    #[test]
    fn test_begin_and_end() {
        let session = ExclusiveSession::new();
        assert!(!session.has_session());

        session.begin_session();
        assert_eq!(session.owner(), Some(Identity::current()));

        session.end_session().unwrap();
        assert!(!session.has_session());
    }

    #[test]
    fn test_begin_is_reentrant_for_owner() {
        let session = ExclusiveSession::new();
        session.begin_session();
        session.begin_session();
        assert_eq!(session.owner(), Some(Identity::current()));
        session.end_session().unwrap();
    }

    #[test]
    fn test_end_when_free_is_noop() {
        let session = ExclusiveSession::new();
        assert!(session.end_session().is_ok());
        assert!(session.end_session_as(Identity::fresh()).is_ok());
    }

    #[test]
    fn test_end_by_non_owner_fails() {
        let session = Arc::new(ExclusiveSession::new());
        let session_clone = session.clone();
        let owner = thread::spawn(move || {
            session_clone.begin_session();
            Identity::current()
        })
        .join()
        .unwrap();

        let err = session.end_session().unwrap_err();
        assert_eq!(
            err,
            SessionError::NotOwner {
                owner,
                caller: Identity::current()
            }
        );
        assert_eq!(session.owner(), Some(owner));
    }

    #[test]
    fn test_hand_off_to_other_identity() {
        let session = Arc::new(ExclusiveSession::new());
        let claimant = Identity::fresh();

        let session_clone = session.clone();
        let waiter = thread::spawn(move || session_clone.await_session_started(claimant));

        thread::sleep(Duration::from_millis(20));
        session.begin_session_as(claimant);
        waiter.join().unwrap();

        assert_eq!(session.owner(), Some(claimant));
        assert!(session.end_session().is_err());
        session.end_session_as(claimant).unwrap();
    }

    #[test]
    fn test_try_begin_fails_when_held() {
        let session = ExclusiveSession::new();
        let other = Identity::fresh();
        session.begin_session_as(other);

        assert!(!session.try_begin_session(None));
        assert!(session.try_begin_session(Some(other)));
        session.end_session_as(other).unwrap();
        assert!(session.try_begin_session(None));
    }

    #[test]
    fn test_grant_next_only_when_free() {
        let session = ExclusiveSession::new();
        let next = Identity::fresh();

        session.begin_session();
        assert_eq!(session.grant_next(|| panic!("must not be asked")), None);
        session.end_session().unwrap();

        assert_eq!(session.grant_next(|| None), None);
        assert_eq!(session.grant_next(|| Some(next)), Some(next));
        assert_eq!(session.owner(), Some(next));
    }

    #[test]
    fn test_contended_begin_waits_for_end() {
        let session = Arc::new(ExclusiveSession::new());
        session.begin_session();

        let session_clone = session.clone();
        let start = Instant::now();
        let contender = thread::spawn(move || {
            session_clone.begin_session();
            session_clone.end_session().unwrap();
        });

        thread::sleep(Duration::from_millis(100));
        assert!(!contender.is_finished());
        session.end_session().unwrap();

        contender.join().unwrap();
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[test]
    fn test_scope_ends_on_drop() {
        let session = ExclusiveSession::new();
        {
            let scope = session.scope();
            assert_eq!(session.owner(), Some(scope.owner()));
        }
        assert!(!session.has_session());
    }

    #[test]
    fn test_nested_scope_keeps_outer_session() {
        let session = ExclusiveSession::new();
        {
            let outer = session.scope();
            {
                let _inner = session.scope();
            }
            assert_eq!(session.owner(), Some(outer.owner()));
        }
        assert!(!session.has_session());
    }

    #[test]
    fn test_end_published_once_per_release() {
        let session = ExclusiveSession::new();
        let ended = session.subscribe_ended();
        let claimant = Identity::fresh();

        session.begin_session();
        session.end_session().unwrap();
        session.end_session().unwrap();
        session.begin_session_as(claimant);
        assert!(session.end_session().is_err());
        session.end_session_as(claimant).unwrap();

        let published: Vec<_> = ended.try_iter().collect();
        assert_eq!(published, vec![Identity::current(), claimant]);
    }

    #[test]
    fn test_dropped_end_subscriber_is_pruned() {
        let session = ExclusiveSession::new();
        drop(session.subscribe_ended());
        let kept = session.subscribe_ended();

        session.begin_session();
        session.end_session().unwrap();
        assert_eq!(session.ended.lock().len(), 1);
        assert_eq!(kept.try_recv().ok(), Some(Identity::current()));
    }
}
