//! Listeners for the "session ended" event.

use std::collections::BTreeMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::warn;

type Listener = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct ListenerSet {
    next_id: u64,
    listeners: BTreeMap<u64, Listener>,
}

/// Registry of callbacks run when the session becomes unauthenticated.
///
/// Listeners run in subscription order. A panicking listener is logged
/// and skipped; the remaining listeners still run.
#[derive(Clone, Default)]
pub struct UnauthorizedListeners {
    inner: Arc<Mutex<ListenerSet>>,
}

impl std::fmt::Debug for UnauthorizedListeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnauthorizedListeners")
            .field("len", &self.len())
            .finish()
    }
}

impl UnauthorizedListeners {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        let mut set = self.inner.lock();
        let id = set.next_id;
        set.next_id += 1;
        set.listeners.insert(id, Arc::new(listener));
        Subscription {
            id,
            registry: Arc::downgrade(&self.inner),
        }
    }

    /// Runs every listener once.
    pub fn notify(&self) {
        // Snapshot so listeners may subscribe or unsubscribe while running.
        let listeners: Vec<Listener> = self.inner.lock().listeners.values().cloned().collect();

        for listener in listeners {
            if catch_unwind(AssertUnwindSafe(|| listener())).is_err() {
                warn!("unauthorized listener panicked");
            }
        }
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().listeners.len()
    }

    /// Returns true if nobody is listening.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Handle returned by [`UnauthorizedListeners::subscribe`].
///
/// Dropping the handle keeps the listener registered; call
/// [`Subscription::unsubscribe`] to remove it.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<ListenerSet>>,
}

impl Subscription {
    /// Removes the listener. Returns false if it was already gone.
    pub fn unsubscribe(self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|set| set.lock().listeners.remove(&self.id).is_some())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, impl Fn() + Send + Sync + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let handle = count.clone();
        (count, move || {
            handle.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_notify_calls_every_listener() {
        let listeners = UnauthorizedListeners::new();
        let (a, listener_a) = counter();
        let (b, listener_b) = counter();
        let _sa = listeners.subscribe(listener_a);
        let _sb = listeners.subscribe(listener_b);

        listeners.notify();

        assert_eq!(a.load(Ordering::SeqCst), 1);
        assert_eq!(b.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_panicking_listener_does_not_block_others() {
        let listeners = UnauthorizedListeners::new();
        let _bad = listeners.subscribe(|| panic!("listener failure"));
        let (count, listener) = counter();
        let _good = listeners.subscribe(listener);

        listeners.notify();

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe() {
        let listeners = UnauthorizedListeners::new();
        let (count, listener) = counter();
        let subscription = listeners.subscribe(listener);
        assert_eq!(listeners.len(), 1);

        assert!(subscription.unsubscribe());
        listeners.notify();

        assert!(listeners.is_empty());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
