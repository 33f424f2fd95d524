//! Component B: finding the match point between the active chain and a
//! candidate chain.
//!
//! The match point is the deepest handler index at which the two chains
//! still agree on both handler name *and* resolved context/params — every
//! handler at or above it is "unchanged" or merely "context changed";
//! everything below it must be freshly validated.

use crate::handler_info::HandlerInfo;

/// Outcome of comparing the active chain against a candidate chain at a
/// single index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelAgreement {
    /// Same handler, same params — nothing about this level changed.
    Same,
    /// Same handler, but its params (and therefore likely its context)
    /// differ — it needs a fresh `model()` call.
    ContextChanged,
    /// Different handler name, or one chain ran out — everything from here
    /// down is new.
    HandlerChanged,
}

/// The deepest index (exclusive) shared between `active` and `candidate`,
/// plus the per-level agreement used by the partitioner.
pub struct MatchPoint {
    /// Number of leading levels that are `Same` or `ContextChanged` (i.e.
    /// not `HandlerChanged`). Levels `0..index` stay active; `index..` must
    /// be exited (from the active chain) and entered (from the candidate).
    pub index: usize,
    pub agreements: Vec<LevelAgreement>,
}

/// Compare `active` (the router's live chain, possibly empty on first
/// transition) against `candidate` (the newly resolved chain) level by
/// level. A dynamic segment whose param value changed is `ContextChanged`
/// rather than `Same`; a differing handler name ends the match entirely.
pub fn get_match_point(active: &[HandlerInfo], candidate: &[HandlerInfo]) -> MatchPoint {
    let mut agreements = Vec::with_capacity(candidate.len());
    let mut index = 0;

    for (i, next) in candidate.iter().enumerate() {
        let Some(current) = active.get(i) else {
            break;
        };
        if current.name != next.name {
            break;
        }
        let agreement = if current.params == next.params && current.query_params == next.query_params {
            LevelAgreement::Same
        } else {
            LevelAgreement::ContextChanged
        };
        agreements.push(agreement);
        index = i + 1;
    }

    MatchPoint { index, agreements }
}
