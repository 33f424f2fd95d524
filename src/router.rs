//! Component I: the `Router` façade and its two-phase builder.
//!
//! The builder/build split mirrors `r2e-core`'s `AppBuilder`: handlers and
//! the recognizer accumulate on a plain struct with no invariants to
//! maintain mid-assembly, and `build()` is the single point where
//! configuration is validated and the router's runtime state (side table,
//! active chain, sequence counter) is allocated.

use crate::commit::{active_query_params, finalize_transition};
use crate::config::{RouterConfig, UrlMethod};
use crate::error::RouterError;
use crate::events;
use crate::handler::{Handler, HandlerRegistry, HandlerState, Model, SuppliedObject};
use crate::handler_info::{self, HandlerInfo};
use crate::match_point::get_match_point;
use crate::params::{merge_allowed, Params, QueryParams};
use crate::partition::partition;
use crate::pipeline::validate_chain;
use crate::recognizer::{RecognizedHandler, Recognizer};
use crate::serializer;
use crate::transition::{RetrySource, Transition};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

type UrlHook = Arc<dyn Fn(&str) + Send + Sync>;
type DidTransitionHook = Arc<dyn Fn(&[CommittedHandler]) + Send + Sync>;

/// One committed chain level, as reported to the `did_transition` hook.
pub struct CommittedHandler {
    pub name: String,
    pub params: Params,
    pub query_params: QueryParams,
}

/// Accumulates handlers, a recognizer, and config before a [`Router`] is
/// built. Nothing here is load-bearing until `build()` runs.
pub struct RouterBuilder {
    registry: HandlerRegistry,
    recognizer: Option<Arc<dyn Recognizer>>,
    config: RouterConfig,
    update_url: Option<UrlHook>,
    replace_url: Option<UrlHook>,
    did_transition: Option<DidTransitionHook>,
}

impl RouterBuilder {
    pub fn new() -> Self {
        Self {
            registry: HandlerRegistry::new(),
            recognizer: None,
            config: RouterConfig::default(),
            update_url: None,
            replace_url: None,
            did_transition: None,
        }
    }

    pub fn handler(mut self, name: impl Into<String>, handler: Arc<dyn Handler>) -> Self {
        self.registry.insert(name.into(), handler);
        self
    }

    pub fn recognizer(mut self, recognizer: Arc<dyn Recognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    pub fn config(mut self, config: RouterConfig) -> Self {
        self.config = config;
        self
    }

    /// Register the host hook called on commit when `urlMethod` is `Update`
    /// (the default) — and as the fallback for `Replace` if no
    /// `on_replace_url` hook is registered.
    pub fn on_update_url(mut self, hook: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.update_url = Some(Arc::new(hook));
        self
    }

    /// Register the host hook called on commit when `urlMethod` is `Replace`.
    pub fn on_replace_url(mut self, hook: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.replace_url = Some(Arc::new(hook));
        self
    }

    /// Register the host hook called with the freshly committed chain after
    /// every successful commit.
    pub fn on_did_transition(mut self, hook: impl Fn(&[CommittedHandler]) + Send + Sync + 'static) -> Self {
        self.did_transition = Some(Arc::new(hook));
        self
    }

    /// Validate configuration and allocate runtime state. Fails only if no
    /// recognizer was supplied — a router with no way to resolve URLs or
    /// route names can't do anything useful.
    pub fn build(self) -> Result<Router, RouterError> {
        self.config.validate()?;
        let recognizer = self
            .recognizer
            .ok_or_else(|| RouterError::UnrecognizedUrl("no recognizer configured on RouterBuilder".into()))?;

        Ok(Router {
            registry: self.registry,
            recognizer,
            config: self.config,
            update_url: self.update_url,
            replace_url: self.replace_url,
            did_transition: self.did_transition,
            states: DashMap::new(),
            active_chain: Mutex::new(Vec::new()),
            sequence: AtomicU64::new(0),
            current_transition: Mutex::new(None),
        })
    }
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The running transition engine: owns the active chain, the per-handler
/// side table, and the recognizer/handler registry supplied at build time.
pub struct Router {
    registry: HandlerRegistry,
    recognizer: Arc<dyn Recognizer>,
    config: RouterConfig,
    update_url: Option<UrlHook>,
    replace_url: Option<UrlHook>,
    did_transition: Option<DidTransitionHook>,
    states: DashMap<String, HandlerState>,
    active_chain: Mutex<Vec<HandlerInfo>>,
    sequence: AtomicU64,
    current_transition: Mutex<Option<Transition>>,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("config", &self.config)
            .field("sequence", &self.sequence)
            .finish()
    }
}

impl Router {
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    /// Begin a transition to a named route, supplying dynamic-segment
    /// params/models leaf-upward.
    pub async fn transition_to(
        &self,
        name: &str,
        supplied: Vec<SuppliedObject>,
        query_params: QueryParams,
    ) -> Result<Transition, RouterError> {
        let recognized = self
            .recognizer
            .handlers_for(name)
            .ok_or_else(|| RouterError::UnrecognizedUrl(name.to_string()))?;
        let active = self.active_chain.lock().unwrap().clone();
        let retry_source = RetrySource::Named {
            name: name.to_string(),
            supplied: supplied.clone(),
            query_params: query_params.clone(),
        };
        let candidate = handler_info::from_named_chain(name, &recognized, supplied, &active)?;
        self.run(
            name,
            recognized,
            candidate,
            query_params,
            self.config.default_url_method,
            retry_source,
        )
        .await
    }

    /// Like [`Router::transition_to`] but the committed URL method is
    /// `Replace` regardless of config default.
    pub async fn replace_with(
        &self,
        name: &str,
        supplied: Vec<SuppliedObject>,
        query_params: QueryParams,
    ) -> Result<Transition, RouterError> {
        let recognized = self
            .recognizer
            .handlers_for(name)
            .ok_or_else(|| RouterError::UnrecognizedUrl(name.to_string()))?;
        let active = self.active_chain.lock().unwrap().clone();
        let retry_source = RetrySource::Named {
            name: name.to_string(),
            supplied: supplied.clone(),
            query_params: query_params.clone(),
        };
        let candidate = handler_info::from_named_chain(name, &recognized, supplied, &active)?;
        self.run(name, recognized, candidate, query_params, UrlMethod::Replace, retry_source)
            .await
    }

    /// Begin a transition resolved from a raw URL (`recognize` path,
    /// `handleURL`). The committed URL is always suppressed — the host
    /// already has the URL it called this with.
    pub async fn handle_url(&self, url: &str) -> Result<Transition, RouterError> {
        let recognized = self
            .recognizer
            .recognize(url)
            .ok_or_else(|| RouterError::UnrecognizedUrl(url.to_string()))?;
        let leaf = recognized
            .last()
            .map(|h| h.handler.clone())
            .ok_or_else(|| RouterError::UnrecognizedUrl(url.to_string()))?;
        let candidate = handler_info::from_recognized_chain(&recognized);
        self.run(
            &leaf,
            recognized,
            candidate,
            QueryParams::new(),
            UrlMethod::Suppress,
            RetrySource::Url(url.to_string()),
        )
        .await
    }

    /// Abort `transition`, re-derive and re-run the same target (named
    /// route or URL) it was created from, and carry its data bag over to
    /// the replacement.
    pub async fn retry(&self, transition: &Transition) -> Result<Transition, RouterError> {
        let source = transition.retry_source().clone();
        transition.abort();
        transition.mark_retried();

        let next = match source {
            RetrySource::Named { name, supplied, query_params } => {
                self.transition_to(&name, supplied, query_params).await?
            }
            RetrySource::Url(url) => self.handle_url(&url).await?,
        };
        next.copy_data_from(transition);
        Ok(next)
    }

    async fn run(
        &self,
        leaf: &str,
        recognized: Vec<RecognizedHandler>,
        mut candidate: Vec<HandlerInfo>,
        query_overrides: QueryParams,
        url_method: UrlMethod,
        retry_source: RetrySource,
    ) -> Result<Transition, RouterError> {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let transition = Transition::new(leaf, sequence, url_method, retry_source);

        {
            let mut current = self.current_transition.lock().unwrap();
            if self.config.dedup_in_flight {
                if let Some(existing) = current.clone() {
                    if existing.is_pending() && existing.target_name() == leaf {
                        info!(route = leaf, "transition_dedup");
                        return Ok(existing);
                    }
                }
            }
            if let Some(existing) = current.clone() {
                if existing.is_pending() {
                    existing.abort();
                }
            }
            *current = Some(transition.clone());
        }

        info!(route = leaf, sequence, "transition_start");

        for (info, rec) in candidate.iter_mut().zip(recognized.iter()) {
            let base = active_query_params(&self.states, &info.name);
            info.query_params = merge_allowed(&base, &query_overrides, &rec.query_params);
        }

        let active = self.active_chain.lock().unwrap().clone();
        let match_point = get_match_point(&active, &candidate);
        let parts = partition(&active, &candidate, &match_point);

        let resolved_updated = match validate_chain(&parts.updated_context, &self.registry, &transition).await {
            Ok(r) => r,
            Err(failure) => {
                let ancestors: Vec<HandlerInfo> = parts
                    .unchanged
                    .iter()
                    .cloned()
                    .chain(failure.resolved.iter().map(|r| r.info.clone()))
                    .collect();
                return self.fail(&transition, failure.error, &ancestors).await;
            }
        };

        let mut ancestors_for_error = parts.unchanged.clone();
        ancestors_for_error.extend(parts.updated_context.iter().cloned());

        let resolved_entered = match validate_chain(&parts.entered, &self.registry, &transition).await {
            Ok(r) => r,
            Err(failure) => {
                ancestors_for_error.extend(failure.resolved.iter().map(|r| r.info.clone()));
                return self.fail(&transition, failure.error, &ancestors_for_error).await;
            }
        };

        finalize_transition(
            &parts.exited,
            &resolved_updated,
            &resolved_entered,
            &self.registry,
            &self.states,
            &transition,
        )
        .await;

        *self.active_chain.lock().unwrap() = candidate.clone();
        {
            let mut current = self.current_transition.lock().unwrap();
            if matches!(current.as_ref(), Some(t) if t.sequence() == transition.sequence()) {
                *current = None;
            }
        }
        info!(route = leaf, sequence, "transition_commit");

        self.publish_url(&transition, &candidate);
        if let Some(hook) = &self.did_transition {
            let committed: Vec<CommittedHandler> = candidate
                .iter()
                .map(|h| CommittedHandler {
                    name: h.name.clone(),
                    params: h.params.clone(),
                    query_params: h.query_params.clone(),
                })
                .collect();
            hook(&committed);
        }

        Ok(transition)
    }

    /// Generate the committed URL from `candidate` and dispatch to the
    /// appropriate host hook per the transition's `url_method`.
    fn publish_url(&self, transition: &Transition, candidate: &[HandlerInfo]) {
        let method = transition.url_method();
        if method == UrlMethod::Suppress {
            return;
        }

        let leaf = match candidate.last() {
            Some(h) => h.name.clone(),
            None => return,
        };
        let mut flat_params = Params::new();
        let mut flat_query = QueryParams::new();
        for info in candidate {
            flat_params.extend(info.params.clone());
            flat_query.extend(info.query_params.clone());
        }
        let Ok(url) = self.recognizer.generate(&leaf, &flat_params, &flat_query) else {
            return;
        };

        match method {
            UrlMethod::Replace => {
                if let Some(hook) = &self.replace_url {
                    hook(&url);
                } else if let Some(hook) = &self.update_url {
                    hook(&url);
                }
            }
            UrlMethod::Update => {
                if let Some(hook) = &self.update_url {
                    hook(&url);
                }
            }
            UrlMethod::Suppress => unreachable!("handled above"),
        }
    }

    async fn fail(
        &self,
        transition: &Transition,
        err: RouterError,
        ancestors: &[HandlerInfo],
    ) -> Result<Transition, RouterError> {
        warn!(error = %err, "transition_abort");
        crate::pipeline::notify_error(&err, ancestors, &self.registry, transition).await;
        transition.fail(err.clone());
        {
            let mut current = self.current_transition.lock().unwrap();
            if matches!(current.as_ref(), Some(t) if t.sequence() == transition.sequence()) {
                *current = None;
            }
        }
        Err(err)
    }

    /// Whether `name` is active given the supplied `contexts` (consumed
    /// right-to-left against `name` and its ancestors) and `query_params`
    /// (which must equal the exact union across `name` and its ancestors).
    pub fn is_active(&self, name: &str, contexts: Vec<SuppliedObject>, query_params: QueryParams) -> bool {
        let active = self.active_chain.lock().unwrap().clone();
        let Some(name_index) = active.iter().position(|h| h.name == name) else {
            return false;
        };

        let mut remaining = contexts;
        let mut union_query = QueryParams::new();

        for info in active[..=name_index].iter().rev() {
            union_query.extend(info.query_params.clone());

            if !info.is_dynamic {
                continue;
            }
            let Some(context) = remaining.pop() else {
                return false;
            };
            match context {
                SuppliedObject::Param(value) => {
                    let Some(seg_name) = info.names.first() else {
                        return false;
                    };
                    if info.params.get(seg_name) != Some(&value) {
                        return false;
                    }
                }
                SuppliedObject::Model(model) => {
                    let stored = self.states.get(&info.name).and_then(|s| s.context.clone());
                    match stored {
                        Some(stored) if Arc::ptr_eq(&stored, &model) => {}
                        _ => return false,
                    }
                }
            }
        }

        remaining.is_empty() && union_query == query_params
    }

    /// Build a URL for a route name without starting a transition. Rejects
    /// any `query_params` key outside the allow-list of `name` or its
    /// ancestors, naming the offending key.
    pub fn generate(&self, name: &str, params: &Params, query_params: &QueryParams) -> Result<String, RouterError> {
        let chain = self
            .recognizer
            .handlers_for(name)
            .ok_or_else(|| RouterError::UnrecognizedUrl(name.to_string()))?;
        let allow_list = serializer::query_params_for_handler(&chain, name);
        serializer::validate_query_params(name, query_params, &allow_list)?;
        self.recognizer.generate(name, params, query_params)
    }

    /// Dispatch a named event to the active chain, leaf-first.
    pub async fn trigger(&self, name: &str, args: &[Model], ignore_failure: bool) {
        let chain: Vec<String> = self
            .active_chain
            .lock()
            .unwrap()
            .iter()
            .map(|h| h.name.clone())
            .collect();
        events::trigger(name, args, &chain, &self.registry, ignore_failure).await;
    }

    /// Exit every active handler and clear the router back to its initial
    /// state. Used by hosts resetting between test cases or logging out.
    pub async fn reset(&self) {
        let exited: Vec<HandlerInfo> = {
            let mut active = self.active_chain.lock().unwrap();
            let mut chain = std::mem::take(&mut *active);
            chain.reverse();
            chain
        };
        crate::commit::exit_handlers(&exited, &self.registry, &self.states).await;
        *self.current_transition.lock().unwrap() = None;
    }

    pub fn current_chain(&self) -> Vec<String> {
        self.active_chain.lock().unwrap().iter().map(|h| h.name.clone()).collect()
    }

    pub fn current_params(&self, name: &str) -> Option<Params> {
        self.active_chain
            .lock()
            .unwrap()
            .iter()
            .find(|h| h.name == name)
            .map(|h| h.params.clone())
    }

    pub fn current_query_params(&self, name: &str) -> QueryParams {
        active_query_params(&self.states, name)
    }
}
