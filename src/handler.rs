//! The handler capability set.
//!
//! `router.js` handlers are plain objects that implement whichever of
//! `beforeModel`/`model`/`afterModel`/`enter`/`setup`/`exit`/`serialize`/
//! `error`/`contextDidChange`/`queryParamsDidChange`/`events` they need; any
//! absent hook is simply skipped. Rust has no polymorphic "maybe has this
//! method" — so [`Handler`] is an `async_trait` whose methods all carry a
//! default no-op (or pass-through) body. Host types implement only the hooks
//! they actually need, exactly like the duck-typed original, but the engine
//! never has to ask "does this respond to X" at runtime.

use crate::params::{Params, QueryParams};
use crate::transition::Transition;
use std::any::Any;
use std::sync::Arc;

/// A host-supplied model, or any other `Any` payload a hook produces.
pub type Model = Arc<dyn Any + Send + Sync>;

/// The result of a handler-provided context: either a real value, or a
/// redirect. See "redirect-by-returning-a-Transition-from-a-hook".
///
/// Unlike the duck-typed original (which detects a returned value happens to
/// be a `Transition`), this is a real sum type. The pipeline still collapses
/// `Redirect` to an empty model afterward, preserving the legacy quirk
/// on purpose (see `pipeline::tests::redirect_return_coerces_model_to_empty`).
pub enum HookOutcome<T> {
    Value(T),
    Redirect(Transition),
}

impl<T> HookOutcome<T> {
    pub fn value(v: T) -> Self {
        HookOutcome::Value(v)
    }
}

/// What happened when a handler's `events` map was asked to handle an event.
///
/// Replaces the duck-typed "returns exactly boolean `true` to keep bubbling,
/// anything else stops it" rule with an explicit enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// Handled, but let ancestors see it too (`router.js`'s literal `true`).
    ContinueBubbling,
    /// Handled, stop bubbling.
    Stop,
}

/// An empty model, used as the "null" surrogate for redirects and for
/// handlers that don't implement `model` at all.
pub fn empty_model() -> Model {
    Arc::new(())
}

/// One level of a route chain, implemented by the host.
///
/// All methods are optional in spirit (default no-ops); `model` is the one
/// exception that must produce *something*, so its default resolves to
/// [`empty_model`] rather than being left unimplemented.
#[async_trait::async_trait]
pub trait Handler: Send + Sync {
    /// Runs before `model`. Returning `Err` aborts/fails the transition.
    async fn before_model(
        &self,
        _transition: &Transition,
        _query_params: &QueryParams,
    ) -> Result<HookOutcome<()>, crate::error::RouterError> {
        Ok(HookOutcome::Value(()))
    }

    /// Resolve this handler's model from its params. Not called at all when
    /// the handler is below the match point and already has a context, or
    /// when the caller supplied a model directly.
    async fn model(
        &self,
        _params: &Params,
        _transition: &Transition,
        _query_params: &QueryParams,
    ) -> Result<HookOutcome<Model>, crate::error::RouterError> {
        Ok(HookOutcome::Value(empty_model()))
    }

    /// Runs after `model` resolves. Return value is intentionally discarded
    /// by the pipeline except for the redirect case.
    async fn after_model(
        &self,
        _context: &Model,
        _transition: &Transition,
        _query_params: &QueryParams,
    ) -> Result<HookOutcome<()>, crate::error::RouterError> {
        Ok(HookOutcome::Value(()))
    }

    /// Called once when this handler becomes active.
    async fn enter(&self) {}

    /// Called every time this handler's context or query params are (re)set.
    async fn setup(&self, _context: &Model, _query_params: &QueryParams) {}

    /// Called once when this handler becomes inactive.
    async fn exit(&self) {}

    /// Turn a model back into URL params. `None` means "no custom
    /// serializer" and the default rules in `params::serialize_default` apply.
    fn serialize(&self, _model: &Model, _names: &[String]) -> Option<Params> {
        None
    }

    /// Called when a non-abort error occurs anywhere at or below this
    /// handler during validation.
    async fn error(&self, _reason: &crate::error::RouterError, _transition: &Transition) {}

    fn context_did_change(&self, _context: &Model) {}

    fn query_params_did_change(&self, _query_params: &QueryParams) {}

    /// Handle a bubbling named event. `None` means "no handler for this
    /// name" (keep bubbling and don't count this handler as having handled
    /// it); `Some(_)` means it was handled.
    async fn handle_event(&self, _name: &str, _args: &[Model]) -> Option<EventOutcome> {
        None
    }
}

/// Whatever the caller passed in at a dynamic handler's slot: a stringified
/// primitive param, or a full model object.
///
/// The original router.js judges "param-like" at runtime (is this
/// string/number coercible-without-NaN); in Rust the call site already knows
/// which one it has, so the distinction is made explicit at construction
/// instead.
pub enum SuppliedObject {
    Param(String),
    Model(Model),
}

impl SuppliedObject {
    pub fn param(value: impl ToString) -> Self {
        SuppliedObject::Param(value.to_string())
    }

    pub fn model<T: Any + Send + Sync>(value: T) -> Self {
        SuppliedObject::Model(Arc::new(value))
    }

    pub fn is_param_like(&self) -> bool {
        matches!(self, SuppliedObject::Param(_))
    }
}

impl Clone for SuppliedObject {
    fn clone(&self) -> Self {
        match self {
            SuppliedObject::Param(value) => SuppliedObject::Param(value.clone()),
            SuppliedObject::Model(model) => SuppliedObject::Model(model.clone()),
        }
    }
}

/// Per-handler transient state the core owns, rather than mutating the
/// host's handler object.
#[derive(Clone, Default)]
pub struct HandlerState {
    pub context: Option<Model>,
    pub query_params: QueryParams,
}

/// A handler with every hook at its default — used as the fallback when a
/// chain names a handler the host never registered. Resolving such a level
/// still needs *something* to call `enter`/`setup`/`exit` on.
pub struct NoopHandler;

#[async_trait::async_trait]
impl Handler for NoopHandler {}

/// Name-keyed handler lookup shared by the pipeline, commit, and event
/// stages. Registration happens once up front via `RouterBuilder`.
pub type HandlerRegistry = std::collections::HashMap<String, Arc<dyn Handler>>;

/// Resolve `name` in `registry`, falling back to a shared [`NoopHandler`]
/// instance rather than erroring — an unregistered handler in the chain is
/// routing-table drift, not a transition failure.
pub fn resolve(registry: &HandlerRegistry, name: &str) -> Arc<dyn Handler> {
    static DEFAULT: std::sync::OnceLock<Arc<dyn Handler>> = std::sync::OnceLock::new();
    registry
        .get(name)
        .cloned()
        .unwrap_or_else(|| DEFAULT.get_or_init(|| Arc::new(NoopHandler)).clone())
}
