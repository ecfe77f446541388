//! Per-category listener registry.
//!
//! Registration calls mutate the list; dispatch cycles read a snapshot, so a
//! listener added or removed mid-cycle takes effect on the next cycle and the
//! current one sees a stable set.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, RwLock};

use tracing::{debug, warn};

use super::ListenerError;

/// Ordered, thread-safe collection of listeners for one category.
///
/// Listeners are identified by handle, i.e. by the `Arc` allocation they were
/// registered under. Registering the same handle twice is a no-op; two
/// distinct allocations of equal values are two listeners.
pub struct ListenerRegistry<L: ?Sized> {
    listeners: RwLock<Vec<Arc<L>>>,
}

impl<L: ?Sized> ListenerRegistry<L> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Append a listener unless the same handle is already present.
    ///
    /// Returns true when the registry transitioned from empty to non-empty.
    pub fn add(&self, listener: Arc<L>) -> bool {
        let mut listeners = self.listeners.write().unwrap();
        if listeners.iter().any(|existing| Arc::ptr_eq(existing, &listener)) {
            debug!("listener handle already registered, ignoring");
            return false;
        }
        let was_empty = listeners.is_empty();
        listeners.push(listener);
        debug!(listeners = listeners.len(), "listener registered");
        was_empty
    }

    /// Remove one listener by handle identity.
    ///
    /// Returns true when the registry transitioned to empty as a result.
    pub fn remove(&self, listener: &Arc<L>) -> bool {
        let mut listeners = self.listeners.write().unwrap();
        let before = listeners.len();
        listeners.retain(|existing| !Arc::ptr_eq(existing, listener));
        listeners.len() != before && listeners.is_empty()
    }

    /// Remove every listener.
    ///
    /// Returns true when the registry transitioned from non-empty to empty.
    pub fn remove_all(&self) -> bool {
        let mut listeners = self.listeners.write().unwrap();
        let was_populated = !listeners.is_empty();
        listeners.clear();
        if was_populated {
            debug!("all listeners removed");
        }
        was_populated
    }

    /// Copy of the current listeners, in registration order, for one dispatch
    /// cycle.
    pub fn snapshot(&self) -> Vec<Arc<L>> {
        self.listeners.read().unwrap().clone()
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.read().unwrap().len()
    }

    /// True when no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<L: ?Sized> Default for ListenerRegistry<L> {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared registry handle.
pub type SharedRegistry<L> = Arc<ListenerRegistry<L>>;

/// Invoke one listener callback, containing failures and panics.
///
/// Returns true when the callback completed without error.
pub fn deliver<L: ?Sized, F>(category: &str, listener: &Arc<L>, call: F) -> bool
where
    F: FnOnce(&L) -> Result<(), ListenerError>,
{
    match std::panic::catch_unwind(AssertUnwindSafe(|| call(listener))) {
        Ok(Ok(())) => true,
        Ok(Err(error)) => {
            warn!(category, error = %error, "listener callback failed");
            false
        }
        Err(panic) => {
            warn!(category, reason = panic_message(&panic), "listener callback panicked");
            false
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}
