//! Removable listener lists
//!
//! Used for collection hooks and aggregate observers. Listeners are called
//! in registration order, outside the internal lock.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Token returned by [`Callbacks::add`], used to remove the listener later
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackId(u64);

impl CallbackId {
    pub(crate) fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

type Listener<A> = Arc<dyn Fn(&A) + Send + Sync>;

pub struct Callbacks<A: ?Sized> {
    listeners: Mutex<Vec<(CallbackId, Listener<A>)>>,
    next_id: AtomicU64,
}

impl<A: ?Sized> Callbacks<A> {
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(CallbackId, Listener<A>)>> {
        self.listeners
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add<F>(&self, listener: F) -> CallbackId
    where
        F: Fn(&A) + Send + Sync + 'static,
    {
        let id = CallbackId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push((id, Arc::new(listener)));
        id
    }

    /// Returns `false` if the listener was not registered
    pub fn remove(&self, id: CallbackId) -> bool {
        let mut listeners = self.lock();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    pub fn has(&self, id: CallbackId) -> bool {
        self.lock().iter().any(|(existing, _)| *existing == id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub(crate) fn fire(&self, args: &A) {
        let listeners: Vec<Listener<A>> = self
            .lock()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener(args);
        }
    }
}

impl<A: ?Sized> Default for Callbacks<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: ?Sized> fmt::Debug for Callbacks<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("listeners", &self.len())
            .finish()
    }
}
