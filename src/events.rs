//! Component H: bubbling a named event up the active chain.
//!
//! Starts at the leaf (deepest active handler) and walks toward the root,
//! stopping at the first handler whose `handle_event` returns
//! [`EventOutcome::Stop`]. If no handler in the chain responds at all, the
//! caller decides whether that's an error (`trigger`) or silently ignored
//! (`try_trigger`).

use crate::handler::{resolve, EventOutcome, HandlerRegistry, Model};
use tracing::warn;

/// Dispatch `name` with `args` down the active chain (leaf-first). Returns
/// `true` if some handler responded, `false` if the event reached the root
/// unhandled.
pub async fn bubble(
    name: &str,
    args: &[Model],
    active_chain: &[String],
    registry: &HandlerRegistry,
) -> bool {
    for handler_name in active_chain.iter().rev() {
        let handler = resolve(registry, handler_name);
        match handler.handle_event(name, args).await {
            Some(EventOutcome::Stop) => return true,
            Some(EventOutcome::ContinueBubbling) => {
                // Handled, but keep walking toward the root per router.js's
                // "return true to let ancestors see it too" convention.
                continue;
            }
            None => continue,
        }
    }
    false
}

/// `bubble`, but logs when nothing in the chain handled the event — the
/// engine's counterpart to the original's "throw if no handler responds and
/// `ignoreFailure` wasn't passed", downgraded to a log line since a
/// library has no host-wide "unhandled event" exception channel to throw into.
pub async fn trigger(
    name: &str,
    args: &[Model],
    active_chain: &[String],
    registry: &HandlerRegistry,
    ignore_failure: bool,
) {
    let handled = bubble(name, args, active_chain, registry).await;
    if !handled && !ignore_failure {
        warn!(event = name, "event_unhandled");
    }
}
