//! Component F: the async validation pipeline — `beforeModel` → `model` →
//! `afterModel`, run level by level down the entered/updated-context
//! portions of a chain, with an abort check between every hook.

use crate::error::RouterError;
use crate::handler::{resolve, HandlerRegistry, Model};
use crate::handler_info::HandlerInfo;
use crate::transition::Transition;

/// A chain level that finished validation, carrying the resolved context
/// that `commit` will hand to `setup`/`context_did_change`.
pub struct Resolved {
    pub info: HandlerInfo,
    pub context: Model,
}

impl std::fmt::Debug for Resolved {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolved").field("info", &self.info).finish()
    }
}

/// A validation failure, carrying whatever levels of this call already
/// resolved before the failing one — the caller needs those to bubble
/// `error()` notifications up from the failing handler through them.
pub struct Failure {
    pub error: RouterError,
    pub resolved: Vec<Resolved>,
}

impl std::fmt::Debug for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Failure")
            .field("error", &self.error)
            .field("resolved", &self.resolved)
            .finish()
    }
}

/// Run the full `beforeModel`/`model`/`afterModel` pipeline over `levels`,
/// in parent-to-child order, checking `transition.is_aborted()` between
/// every hook. A hook raising an error unwinds the chain immediately with
/// that error; the caller is responsible for firing `notify_error` on the
/// already-resolved ancestors afterward.
///
/// A hook returning `Redirect` does not skip the rest of this level: its
/// model is coerced to [`crate::handler::empty_model`] and `after_model`
/// still runs against that empty model (the legacy quirk this engine
/// preserves), after which the chain unwinds as `TransitionAborted` — a
/// redirect always ends the transition that triggered it.
pub async fn validate_chain(
    levels: &[HandlerInfo],
    registry: &HandlerRegistry,
    transition: &Transition,
) -> Result<Vec<Resolved>, Failure> {
    let mut resolved = Vec::with_capacity(levels.len());

    for info in levels {
        if let Err(error) = transition.check_aborted() {
            return Err(Failure { error, resolved });
        }
        let handler = resolve(registry, &info.name);
        let mut level_redirected = false;

        match handler.before_model(transition, &info.query_params).await {
            Ok(outcome) => level_redirected |= redirected(&outcome),
            Err(error) => return Err(Failure { error, resolved }),
        }

        if let Err(error) = transition.check_aborted() {
            return Err(Failure { error, resolved });
        }

        let context = if level_redirected {
            crate::handler::empty_model()
        } else if let Some(model) = &info.provided_model {
            model.clone()
        } else {
            match handler.model(&info.params, transition, &info.query_params).await {
                Ok(crate::handler::HookOutcome::Value(model)) => model,
                Ok(crate::handler::HookOutcome::Redirect(_)) => {
                    level_redirected = true;
                    crate::handler::empty_model()
                }
                Err(error) => return Err(Failure { error, resolved }),
            }
        };

        if let Err(error) = transition.check_aborted() {
            return Err(Failure { error, resolved });
        }

        match handler.after_model(&context, transition, &info.query_params).await {
            Ok(outcome) => level_redirected |= redirected(&outcome),
            Err(error) => return Err(Failure { error, resolved }),
        }

        resolved.push(Resolved {
            info: info.clone(),
            context,
        });

        if level_redirected {
            return Err(Failure {
                error: RouterError::TransitionAborted,
                resolved,
            });
        }
    }

    Ok(resolved)
}

fn redirected<T>(outcome: &crate::handler::HookOutcome<T>) -> bool {
    matches!(outcome, crate::handler::HookOutcome::Redirect(_))
}

/// Bubble a validation failure's `error()` notification from the failing
/// handler's already-resolved ancestors, deepest first, up to the root.
/// Clean aborts don't raise an `error` event.
pub async fn notify_error(
    err: &RouterError,
    ancestors: &[HandlerInfo],
    registry: &HandlerRegistry,
    transition: &Transition,
) {
    if err.is_aborted() {
        return;
    }
    for info in ancestors.iter().rev() {
        let handler = resolve(registry, &info.name);
        handler.error(err, transition).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{empty_model, Handler, HookOutcome};
    use crate::params::QueryParams;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingHandler(Arc<AtomicUsize>);

    #[async_trait]
    impl Handler for CountingHandler {
        async fn model(
            &self,
            _params: &crate::params::Params,
            _transition: &Transition,
            _query_params: &QueryParams,
        ) -> Result<HookOutcome<Model>, RouterError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(HookOutcome::Value(empty_model()))
        }
    }

    struct FailingHandler;

    #[async_trait]
    impl Handler for FailingHandler {
        async fn model(
            &self,
            _params: &crate::params::Params,
            _transition: &Transition,
            _query_params: &QueryParams,
        ) -> Result<HookOutcome<Model>, RouterError> {
            Err(RouterError::hook_failed("posts", "boom"))
        }
    }

    struct RedirectingHandler;

    #[async_trait]
    impl Handler for RedirectingHandler {
        async fn before_model(
            &self,
            _transition: &Transition,
            _query_params: &QueryParams,
        ) -> Result<HookOutcome<()>, RouterError> {
            Ok(HookOutcome::Redirect(Transition::for_test("login")))
        }
    }

    struct RecordingAfterModelHandler {
        before_model_redirects: bool,
        seen: Arc<std::sync::Mutex<Vec<bool>>>,
    }

    #[async_trait]
    impl Handler for RecordingAfterModelHandler {
        async fn before_model(
            &self,
            _transition: &Transition,
            _query_params: &QueryParams,
        ) -> Result<HookOutcome<()>, RouterError> {
            if self.before_model_redirects {
                Ok(HookOutcome::Redirect(Transition::for_test("login")))
            } else {
                Ok(HookOutcome::Value(()))
            }
        }

        async fn model(
            &self,
            _params: &crate::params::Params,
            _transition: &Transition,
            _query_params: &QueryParams,
        ) -> Result<HookOutcome<Model>, RouterError> {
            if self.before_model_redirects {
                Ok(HookOutcome::Value(empty_model()))
            } else {
                Ok(HookOutcome::Redirect(Transition::for_test("login")))
            }
        }

        async fn after_model(
            &self,
            context: &Model,
            _transition: &Transition,
            _query_params: &QueryParams,
        ) -> Result<HookOutcome<()>, RouterError> {
            self.seen.lock().unwrap().push(context.downcast_ref::<()>().is_some());
            Ok(HookOutcome::Value(()))
        }
    }

    fn info(name: &str) -> HandlerInfo {
        HandlerInfo {
            name: name.to_string(),
            is_dynamic: false,
            names: Vec::new(),
            params: Default::default(),
            query_params: Default::default(),
            provided_model: None,
        }
    }

    #[tokio::test]
    async fn validate_chain_runs_model_for_every_level() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut registry = HandlerRegistry::new();
        registry.insert("index".into(), Arc::new(CountingHandler(counter.clone())));
        registry.insert("posts".into(), Arc::new(CountingHandler(counter.clone())));
        let transition = Transition::for_test("posts");

        let resolved = validate_chain(&[info("index"), info("posts")], &registry, &transition)
            .await
            .unwrap();

        assert_eq!(resolved.len(), 2);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn validate_chain_stops_at_first_error() {
        let mut registry = HandlerRegistry::new();
        registry.insert("posts".into(), Arc::new(FailingHandler));
        let transition = Transition::for_test("posts");

        let failure = validate_chain(&[info("posts")], &registry, &transition)
            .await
            .unwrap_err();
        assert!(matches!(failure.error, RouterError::HookFailed { .. }));
    }

    #[tokio::test]
    async fn validate_chain_aborts_immediately_if_transition_already_cancelled() {
        let registry = HandlerRegistry::new();
        let transition = Transition::for_test("posts");
        transition.abort();

        let failure = validate_chain(&[info("posts")], &registry, &transition)
            .await
            .unwrap_err();
        assert!(failure.error.is_aborted());
    }

    #[tokio::test]
    async fn validate_chain_uses_provided_model_without_calling_model_hook() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut registry = HandlerRegistry::new();
        registry.insert("showPost".into(), Arc::new(CountingHandler(counter.clone())));
        let transition = Transition::for_test("showPost");

        let mut level = info("showPost");
        level.provided_model = Some(empty_model());

        validate_chain(&[level], &registry, &transition).await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn before_model_redirect_aborts_the_chain() {
        let mut registry = HandlerRegistry::new();
        registry.insert("showPost".into(), Arc::new(RedirectingHandler));
        let transition = Transition::for_test("showPost");

        let failure = validate_chain(&[info("showPost")], &registry, &transition)
            .await
            .unwrap_err();
        assert!(failure.error.is_aborted());
    }

    #[tokio::test]
    async fn redirect_return_coerces_model_to_empty() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut registry = HandlerRegistry::new();
        registry.insert(
            "showPost".into(),
            Arc::new(RecordingAfterModelHandler {
                before_model_redirects: true,
                seen: seen.clone(),
            }),
        );
        let transition = Transition::for_test("showPost");

        let failure = validate_chain(&[info("showPost")], &registry, &transition)
            .await
            .unwrap_err();

        assert!(failure.error.is_aborted());
        assert_eq!(*seen.lock().unwrap(), vec![true]);
        assert_eq!(failure.resolved.len(), 1);
        assert!(failure.resolved[0].context.downcast_ref::<()>().is_some());
    }

    #[tokio::test]
    async fn model_redirect_also_coerces_to_empty_before_after_model() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut registry = HandlerRegistry::new();
        registry.insert(
            "showPost".into(),
            Arc::new(RecordingAfterModelHandler {
                before_model_redirects: false,
                seen: seen.clone(),
            }),
        );
        let transition = Transition::for_test("showPost");

        let failure = validate_chain(&[info("showPost")], &registry, &transition)
            .await
            .unwrap_err();

        assert!(failure.error.is_aborted());
        assert_eq!(*seen.lock().unwrap(), vec![true]);
    }
}
