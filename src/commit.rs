//! Component G: finalizing a transition — exiting left-behind handlers,
//! entering/setting-up new and changed ones, and settling the transition.
//! Nothing here can fail: by the time `commit` runs, validation has
//! already succeeded and the transition is not aborted.

use crate::handler::{resolve, HandlerRegistry, HandlerState};
use crate::params::QueryParams;
use crate::pipeline::Resolved;
use crate::transition::Transition;
use dashmap::DashMap;

/// Run a handler's `exit` hook and drop its side-table entry, deepest
/// handler first — `partition::exited` is already in that order.
pub async fn exit_handlers(
    exited: &[crate::handler_info::HandlerInfo],
    registry: &HandlerRegistry,
    states: &DashMap<String, HandlerState>,
) {
    for info in exited {
        let handler = resolve(registry, &info.name);
        handler.exit().await;
        states.remove(&info.name);
    }
}

/// Re-run `setup` for a handler whose context or query params changed but
/// that stayed active (the `updated_context` bucket) or newly became active
/// (the `entered` bucket). Shared because the side-table bookkeeping and
/// `setup`/`*_did_change` sequence is identical for both.
async fn setup_level(
    resolved: &Resolved,
    registry: &HandlerRegistry,
    states: &DashMap<String, HandlerState>,
    call_enter: bool,
) {
    let handler = resolve(registry, &resolved.info.name);
    if call_enter {
        handler.enter().await;
    }
    handler.setup(&resolved.context, &resolved.info.query_params).await;
    handler.context_did_change(&resolved.context);
    handler.query_params_did_change(&resolved.info.query_params);
    states.insert(
        resolved.info.name.clone(),
        HandlerState {
            context: Some(resolved.context.clone()),
            query_params: resolved.info.query_params.clone(),
        },
    );
}

/// Finalize a transition: exit stale handlers, run `setup` for
/// updated-context and newly entered handlers (the latter also getting
/// `enter` first), then settle the transition as committed.
///
/// A handler that stayed active with both the same params and the same
/// query params never reaches `commit` at all — `match_point` classifies
/// a query-param-only change as `ContextChanged`, so "unchanged" levels by
/// construction have nothing left to refresh here.
pub async fn finalize_transition(
    exited: &[crate::handler_info::HandlerInfo],
    updated_context: &[Resolved],
    entered: &[Resolved],
    registry: &HandlerRegistry,
    states: &DashMap<String, HandlerState>,
    transition: &Transition,
) {
    exit_handlers(exited, registry, states).await;

    for resolved in updated_context {
        setup_level(resolved, registry, states, false).await;
    }

    for resolved in entered {
        setup_level(resolved, registry, states, true).await;
    }

    transition.commit();
}

/// Look up the live query params the handler-info assembler should merge
/// against for a given handler.
pub fn active_query_params(states: &DashMap<String, HandlerState>, handler: &str) -> QueryParams {
    states.get(handler).map(|s| s.query_params.clone()).unwrap_or_default()
}
