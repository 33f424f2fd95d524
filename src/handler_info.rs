//! Component A: assembling a `HandlerInfo` chain from a recognized route.
//!
//! A `RecognizedHandler` only knows what the recognizer told it (names,
//! whether it's dynamic, URL-parsed params). `HandlerInfo` is the richer,
//! per-transition view the rest of the engine works with: it also carries
//! the caller-supplied context/params for that level and the handler's
//! query-param allow-list merged against the router's live state.

use crate::handler::SuppliedObject;
use crate::params::{Params, QueryParams};
use crate::recognizer::RecognizedHandler;

/// One level of a resolved chain, ready to be fed to the match-point /
/// partition / pipeline stages.
#[derive(Clone)]
pub struct HandlerInfo {
    pub name: String,
    pub is_dynamic: bool,
    pub names: Vec<String>,
    pub params: Params,
    pub query_params: QueryParams,
    /// Present only when the caller supplied a context object directly for
    /// this exact level (`transitionTo('showPost', post)`), rather than a
    /// param to resolve via `model()`.
    pub provided_model: Option<crate::handler::Model>,
}

impl std::fmt::Debug for HandlerInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerInfo")
            .field("name", &self.name)
            .field("is_dynamic", &self.is_dynamic)
            .field("names", &self.names)
            .field("params", &self.params)
            .field("query_params", &self.query_params)
            .field("provided_model", &self.provided_model.is_some())
            .finish()
    }
}

impl HandlerInfo {
    fn from_recognized(recognized: &RecognizedHandler) -> Self {
        Self {
            name: recognized.handler.clone(),
            is_dynamic: recognized.is_dynamic,
            names: recognized.names.clone(),
            params: recognized.params.clone().unwrap_or_default(),
            query_params: QueryParams::new(),
            provided_model: None,
        }
    }
}

/// Build the `HandlerInfo` chain for a `recognize`d URL transition: params
/// come straight from the recognizer, there are no supplied objects to
/// distribute.
pub fn from_recognized_chain(chain: &[RecognizedHandler]) -> Vec<HandlerInfo> {
    chain.iter().map(HandlerInfo::from_recognized).collect()
}

/// Build the `HandlerInfo` chain for a named-route transition, distributing
/// the caller's trailing `contexts` across the chain's dynamic segments from
/// the leaf upward.
///
/// Each dynamic handler in the chain consumes exactly one context/param off
/// the back of `supplied`, in reverse chain order, matching the original's
/// "contexts apply to the most specific dynamic segments first" rule. A
/// dynamic handler with nothing left to consume reuses its param from
/// `active` (the router's currently active chain) when that handler is
/// still present there — re-navigating to a still-active dynamic route
/// without re-supplying its param keeps the router's current value instead
/// of dropping it.
/// Returns `TooManyContextObjects` if more were supplied than the chain has
/// dynamic segments to receive them.
pub fn from_named_chain(
    leaf: &str,
    chain: &[RecognizedHandler],
    supplied: Vec<SuppliedObject>,
    active: &[HandlerInfo],
) -> Result<Vec<HandlerInfo>, crate::error::RouterError> {
    let dynamic_count = chain.iter().filter(|h| h.is_dynamic).count();
    if supplied.len() > dynamic_count {
        return Err(crate::error::RouterError::TooManyContextObjects {
            leaf: leaf.to_string(),
        });
    }

    let mut remaining: Vec<SuppliedObject> = supplied;
    let mut infos: Vec<HandlerInfo> = chain.iter().map(HandlerInfo::from_recognized).collect();

    for info in infos.iter_mut().rev() {
        if !info.is_dynamic {
            continue;
        }
        let Some(object) = remaining.pop() else {
            if let Some(old) = active.iter().find(|a| a.name == info.name) {
                for name in &info.names {
                    if let Some(value) = old.params.get(name) {
                        info.params.insert(name.clone(), value.clone());
                    }
                }
            }
            continue;
        };
        match object {
            SuppliedObject::Param(value) => {
                if let Some(name) = info.names.first() {
                    info.params.insert(name.clone(), value);
                }
            }
            SuppliedObject::Model(model) => {
                info.provided_model = Some(model);
            }
        }
    }

    Ok(infos)
}
