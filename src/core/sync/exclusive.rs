/*!
 * Exclusive Service Decorator
 *
 * Serializes every call into a wrapped service through an ExclusiveSession
 */

use super::session::ExclusiveSession;

/// Wraps a service so only one thread at a time can call into it
///
/// Calls nest: calling back into the same `Exclusive` from inside a closure
/// runs immediately and the session stays held until the outermost call
/// returns.
///
/// # Example
///
/// ```
/// use resource_orchestrator::Exclusive;
/// use std::sync::atomic::{AtomicU32, Ordering};
///
/// let counter = Exclusive::new(AtomicU32::new(0));
/// counter.call(|c| c.fetch_add(1, Ordering::Relaxed));
/// assert_eq!(counter.into_inner().into_inner(), 1);
/// ```
pub struct Exclusive<S> {
    service: S,
    session: ExclusiveSession,
}

impl<S> Exclusive<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            session: ExclusiveSession::new(),
        }
    }

    /// Run `f` against the service inside an exclusive session
    pub fn call<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        let _scope = self.session.scope();
        f(&self.service)
    }

    /// The session guarding the service
    pub fn session(&self) -> &ExclusiveSession {
        &self.session
    }

    pub fn into_inner(self) -> S {
        self.service
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    struct Probe {
        busy: AtomicBool,
    }

    impl Probe {
        fn work(&self) -> bool {
            let overlapped = self.busy.swap(true, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(2));
            self.busy.store(false, Ordering::SeqCst);
            overlapped
        }
    }

    #[test]
    fn test_calls_never_overlap() {
        let probe = Arc::new(Exclusive::new(Probe {
            busy: AtomicBool::new(false),
        }));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let probe = probe.clone();
                thread::spawn(move || (0..10).any(|_| probe.call(Probe::work)))
            })
            .collect();

        for handle in handles {
            assert!(!handle.join().unwrap(), "calls overlapped");
        }
        assert!(!probe.session().has_session());
    }

    #[test]
    fn test_nested_call_keeps_session_held() {
        let guarded = Arc::new(Exclusive::new(AtomicBool::new(false)));

        let held_after_inner = guarded.call(|flag| {
            guarded.call(|inner| inner.store(true, Ordering::SeqCst));
            flag.load(Ordering::SeqCst) && guarded.session().has_session()
        });
        assert!(held_after_inner);
        assert!(!guarded.session().has_session());

        let contender = {
            let guarded = guarded.clone();
            thread::spawn(move || guarded.call(|flag| flag.load(Ordering::SeqCst)))
        };
        guarded.call(|_| {
            guarded.call(|_| ());
            thread::sleep(Duration::from_millis(20));
            assert_eq!(guarded.session().owner(), Some(crate::Identity::current()));
        });
        assert!(contender.join().unwrap());
    }

    #[test]
    fn test_session_released_after_panic() {
        let guarded = Arc::new(Exclusive::new(()));
        let guarded_clone = guarded.clone();

        let result = thread::spawn(move || guarded_clone.call(|_| panic!("boom"))).join();
        assert!(result.is_err());
        assert!(!guarded.session().has_session());
    }
}
