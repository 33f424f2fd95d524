//! The in-flight transition object.
//!
//! `router.js`'s `Transition` is simultaneously a cancellation token, a
//! thenable, and a per-transition data bag that handlers stash arbitrary
//! values on. Those three roles are split into their natural Rust
//! counterparts here: [`tokio_util::sync::CancellationToken`] for abort
//! propagation, [`crate::deferred::Deferred`] for the thenable promise, and a
//! `DashMap` keyed by `TypeId` for the data bag ("typed data bag"
//! redesign of the original's free-form property assignment).

use crate::config::UrlMethod;
use crate::deferred::Deferred;
use crate::error::RouterError;
use crate::handler::SuppliedObject;
use crate::params::QueryParams;
use dashmap::DashMap;
use std::any::{Any, TypeId};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

/// The terminal state a transition settles into.
#[derive(Clone)]
pub enum Outcome {
    Committed,
    Aborted(RouterError),
}

/// What `retry()` needs to re-derive and re-run the same transition: either
/// the named-route arguments that produced it, or the raw URL.
#[derive(Clone)]
pub enum RetrySource {
    Named {
        name: String,
        supplied: Vec<SuppliedObject>,
        query_params: QueryParams,
    },
    Url(String),
}

struct Inner {
    target_name: String,
    sequence: u64,
    url_method: Mutex<UrlMethod>,
    retry_source: RetrySource,
    cancel: CancellationToken,
    retried: AtomicBool,
    settled: Deferred<Outcome>,
    data: DashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

/// A handle to one run of the resolver/pipeline/commit sequence.
///
/// Cloning a `Transition` shares the same underlying state — every clone
/// observes the same abort, the same settlement, and the same data bag. This
/// is what lets a `Transition` be threaded through handler hooks by value
/// while still letting `router.abort()` reach it from outside.
#[derive(Clone)]
pub struct Transition {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transition")
            .field("target_name", &self.inner.target_name)
            .field("sequence", &self.inner.sequence)
            .finish()
    }
}

impl Transition {
    pub(crate) fn new(
        target_name: impl Into<String>,
        sequence: u64,
        url_method: UrlMethod,
        retry_source: RetrySource,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                target_name: target_name.into(),
                sequence,
                url_method: Mutex::new(url_method),
                retry_source,
                cancel: CancellationToken::new(),
                retried: AtomicBool::new(false),
                settled: Deferred::new(),
                data: DashMap::new(),
            }),
        }
    }

    /// Build a bare transition for handler unit tests that don't go through
    /// a [`crate::router::Router`].
    #[cfg(any(test, feature = "test-util"))]
    pub fn for_test(target_name: impl Into<String>) -> Self {
        let name = target_name.into();
        Self::new(
            name.clone(),
            0,
            UrlMethod::Update,
            RetrySource::Named {
                name,
                supplied: Vec::new(),
                query_params: QueryParams::new(),
            },
        )
    }

    pub fn target_name(&self) -> &str {
        &self.inner.target_name
    }

    pub fn sequence(&self) -> u64 {
        self.inner.sequence
    }

    pub fn url_method(&self) -> UrlMethod {
        *self.inner.url_method.lock().unwrap()
    }

    /// Switch `urlMethod` after creation: `Replace` uses `replace_url` on
    /// commit, `Suppress` skips the URL hook entirely, anything else uses
    /// `update_url`.
    pub fn method(&self, method: UrlMethod) {
        *self.inner.url_method.lock().unwrap() = method;
    }

    pub(crate) fn retry_source(&self) -> &RetrySource {
        &self.inner.retry_source
    }

    /// True once `abort()` has been called on this transition or any clone.
    pub fn is_aborted(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    /// True until the transition has committed or aborted — used by the
    /// router to decide whether a new `transition_to` call to the same
    /// target can be satisfied by the already-running one.
    pub fn is_pending(&self) -> bool {
        !self.inner.settled.is_settled()
    }

    /// Cancel this transition. Idempotent. Callers still in the validation
    /// pipeline observe this on their next `is_aborted()` check between
    /// steps and unwind with `RouterError::TransitionAborted`.
    pub fn abort(&self) {
        self.inner.cancel.cancel();
        self.inner.settled.resolve(Outcome::Aborted(RouterError::TransitionAborted));
    }

    /// Mark this transition as having been retried — set by
    /// [`crate::router::Router::retry`] on the original transition once it
    /// has aborted and handed off to the replacement it produced.
    pub fn mark_retried(&self) {
        self.inner.retried.store(true, Ordering::SeqCst);
    }

    pub fn was_retried(&self) -> bool {
        self.inner.retried.load(Ordering::SeqCst)
    }

    /// Resolve the outer promise as committed. No-op if already settled
    /// (e.g. an abort raced the commit).
    pub(crate) fn commit(&self) {
        self.inner.settled.resolve(Outcome::Committed);
    }

    pub(crate) fn fail(&self, err: RouterError) {
        self.inner.settled.resolve(Outcome::Aborted(err));
    }

    /// Await the transition's terminal outcome — the Rust counterpart to
    /// `transition.then(...)`.
    pub async fn wait(&self) -> Outcome {
        self.inner.settled.wait().await
    }

    /// Cooperative cancellation point. Call between pipeline steps so an
    /// abort requested mid-flight stops further hook dispatch promptly.
    pub(crate) fn check_aborted(&self) -> Result<(), RouterError> {
        if self.is_aborted() {
            Err(RouterError::TransitionAborted)
        } else {
            Ok(())
        }
    }

    /// Stash a value of type `T` on this transition's data bag, replacing
    /// any previous value of the same type.
    pub fn set_data<T: Any + Send + Sync>(&self, value: T) {
        self.inner.data.insert(TypeId::of::<T>(), Arc::new(value));
    }

    /// Retrieve a previously stashed value of type `T`, if any.
    pub fn data<T: Any + Send + Sync + Clone>(&self) -> Option<T> {
        self.inner
            .data
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref::<T>().cloned())
    }

    /// Copy every entry of `other`'s data bag into this transition's —
    /// used by `Router::retry` so the retried transition carries over
    /// whatever the original one had stashed.
    pub(crate) fn copy_data_from(&self, other: &Transition) {
        for entry in other.inner.data.iter() {
            self.inner.data.insert(*entry.key(), entry.value().clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_transition_is_not_aborted() {
        let t = Transition::for_test("showPost");
        assert!(!t.is_aborted());
    }

    #[test]
    fn abort_is_observed_by_all_clones() {
        let t = Transition::for_test("showPost");
        let clone = t.clone();
        t.abort();
        assert!(clone.is_aborted());
    }

    #[tokio::test]
    async fn abort_settles_the_promise_as_aborted() {
        let t = Transition::for_test("showPost");
        t.abort();
        match t.wait().await {
            Outcome::Aborted(err) => assert!(err.is_aborted()),
            Outcome::Committed => panic!("expected Aborted"),
        }
    }

    #[tokio::test]
    async fn commit_settles_the_promise_as_committed() {
        let t = Transition::for_test("showPost");
        t.commit();
        match t.wait().await {
            Outcome::Committed => {}
            Outcome::Aborted(_) => panic!("expected Committed"),
        }
    }

    #[test]
    fn data_bag_roundtrips_by_type() {
        #[derive(Clone, PartialEq, Debug)]
        struct UserId(u64);

        let t = Transition::for_test("showPost");
        assert!(t.data::<UserId>().is_none());
        t.set_data(UserId(7));
        assert_eq!(t.data::<UserId>(), Some(UserId(7)));
    }

    #[test]
    fn is_pending_becomes_false_after_commit() {
        let t = Transition::for_test("showPost");
        assert!(t.is_pending());
        t.commit();
        assert!(!t.is_pending());
    }

    #[test]
    fn retried_flag_starts_false() {
        let t = Transition::for_test("showPost");
        assert!(!t.was_retried());
        t.mark_retried();
        assert!(t.was_retried());
    }
}
