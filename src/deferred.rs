//! Minimal single-resolution "thenable" primitive.
//!
//! `router.js`'s `Transition` exposes a `promise` backed by an ambient
//! deferred/promise library. This crate has no such ambient dependency, so
//! `Deferred<T>` is a small purpose-built stand-in: write-once, clone-many,
//! observed via an async `wait()`. It is not a general promise combinator
//! library — it only does enough to make [`crate::transition::Transition`]
//! thenable.

use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

struct Inner<T> {
    value: Mutex<Option<T>>,
    notify: Notify,
}

/// A write-once, clone-many async cell.
///
/// Cloning a `Deferred` shares the same underlying slot: resolving any clone
/// resolves all of them, and every clone's `wait()` observes the same value.
pub struct Deferred<T: Clone> {
    inner: Arc<Inner<T>>,
}

impl<T: Clone> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone> Default for Deferred<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Deferred<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                value: Mutex::new(None),
                notify: Notify::new(),
            }),
        }
    }

    /// Resolve this deferred with `value`. Subsequent calls are no-ops: a
    /// `Transition` settles exactly once.
    pub fn resolve(&self, value: T) {
        let mut slot = self.inner.value.lock().unwrap();
        if slot.is_none() {
            *slot = Some(value);
            drop(slot);
            self.inner.notify.notify_waiters();
        }
    }

    /// True if `resolve` has already been called.
    pub fn is_settled(&self) -> bool {
        self.inner.value.lock().unwrap().is_some()
    }

    /// Await the resolved value, cloning it out. Resolves immediately if
    /// already settled.
    pub async fn wait(&self) -> T {
        loop {
            if let Some(value) = self.inner.value.lock().unwrap().clone() {
                return value;
            }
            let notified = self.inner.notify.notified();
            // Re-check after registering for notification to avoid missing a
            // resolve() that happened between the lock check above and here.
            if let Some(value) = self.inner.value.lock().unwrap().clone() {
                return value;
            }
            notified.await;
        }
    }
}
