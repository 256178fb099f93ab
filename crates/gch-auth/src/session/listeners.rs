//! Listener registry with replay-on-subscribe.
//!
//! The registry owns the `watch` channel holding the current state. Publishing
//! a new state and registering a listener both run under the same dispatch
//! lock, so a new listener sees the current state exactly once and then every
//! later transition, with no gap and no duplicate.
//!
//! Callbacks run synchronously on the publishing task. They may drop or
//! unsubscribe any [`Subscription`], but must not call `subscribe` themselves.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::watch;
use tracing::trace;

use super::state::SessionState;

type Callback = Arc<dyn Fn(&SessionState) + Send + Sync>;

struct Inner {
    next_id: AtomicU64,
    listeners: Mutex<BTreeMap<u64, Callback>>,
    dispatch: Mutex<()>,
    state: watch::Sender<SessionState>,
}

impl Inner {
    fn listeners(&self) -> MutexGuard<'_, BTreeMap<u64, Callback>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn dispatch(&self) -> MutexGuard<'_, ()> {
        self.dispatch.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn remove(&self, id: u64) -> bool {
        self.listeners().remove(&id).is_some()
    }
}

/// Holds the current session state and the callbacks observing it.
#[derive(Clone)]
pub struct ListenerRegistry {
    inner: Arc<Inner>,
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.len())
            .field("state", &self.current().name())
            .finish()
    }
}

impl ListenerRegistry {
    /// Create a registry starting in `initial`.
    pub fn new(initial: SessionState) -> Self {
        let (state, _) = watch::channel(initial);
        Self {
            inner: Arc::new(Inner {
                next_id: AtomicU64::new(1),
                listeners: Mutex::new(BTreeMap::new()),
                dispatch: Mutex::new(()),
                state,
            }),
        }
    }

    /// The current state.
    pub fn current(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    /// A receiver for async consumers.
    pub fn watch(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    /// Number of registered callbacks.
    pub fn len(&self) -> usize {
        self.inner.listeners().len()
    }

    /// Whether no callbacks are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Register a callback. It is invoked once with the current state before
    /// this returns, then on every published state.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&SessionState) + Send + Sync + 'static,
    {
        let callback: Callback = Arc::new(callback);
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);

        let _dispatch = self.inner.dispatch();
        self.inner.listeners().insert(id, callback.clone());
        let current = self.current();
        callback(&current);
        trace!(listener_id = id, "Session listener registered");

        Subscription {
            id,
            registry: Some(Arc::downgrade(&self.inner)),
        }
    }

    /// Replace the current state and notify every callback.
    pub fn publish(&self, state: SessionState) {
        let _dispatch = self.inner.dispatch();
        self.inner.state.send_replace(state.clone());

        let callbacks: Vec<Callback> = self.inner.listeners().values().cloned().collect();
        for callback in callbacks {
            callback(&state);
        }
    }
}

/// Handle returned by [`ListenerRegistry::subscribe`].
///
/// Dropping it unsubscribes; call [`detach`](Subscription::detach) to keep
/// the callback registered for the registry's lifetime.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    registry: Option<Weak<Inner>>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("attached", &self.registry.is_some())
            .finish()
    }
}

impl Subscription {
    /// Listener ID.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Remove the callback. Returns whether it was still registered.
    pub fn unsubscribe(mut self) -> bool {
        self.release()
    }

    /// Keep the callback registered and give up the handle.
    pub fn detach(mut self) {
        self.registry = None;
    }

    fn release(&mut self) -> bool {
        match self.registry.take().and_then(|weak| weak.upgrade()) {
            Some(inner) => {
                let removed = inner.remove(self.id);
                trace!(listener_id = self.id, "Session listener removed");
                removed
            }
            None => false,
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}
