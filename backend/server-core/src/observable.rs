//! Single-writer observable state.
//!
//! Each process-wide value (server state, credentials, network identity,
//! session token) lives in a [`StateCell`] owned by exactly one component.
//! Only the owner can write; everyone else reads or subscribes.

use tokio::sync::watch;

/// A value with one writer and any number of subscribers.
pub struct StateCell<T> {
    tx: watch::Sender<T>,
}

impl<T: Clone> StateCell<T> {
    pub fn new(initial: T) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Snapshot of the current value.
    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }

    pub(crate) fn set(&self, value: T) {
        self.tx.send_replace(value);
    }

    /// Atomically inspect and modify the value.
    ///
    /// `apply` returns whether it changed anything; subscribers are only woken
    /// when it did. Returns the same flag.
    pub(crate) fn transition<F>(&self, apply: F) -> bool
    where
        F: FnOnce(&mut T) -> bool,
    {
        self.tx.send_if_modified(apply)
    }
}

impl<T: Clone + PartialEq> StateCell<T> {
    /// Store `value` and notify subscribers only if it differs from the current one.
    pub(crate) fn replace_if_changed(&self, value: T) -> bool {
        self.transition(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        })
    }
}

impl<T: Clone + Default> Default for StateCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
