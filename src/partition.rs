//! Component D: partitioning a transition into unchanged / updated-context /
//! entered / exited handler groups, driven by a [`MatchPoint`].

use crate::handler_info::HandlerInfo;
use crate::match_point::{LevelAgreement, MatchPoint};

/// The four buckets every level of `active`/`candidate` falls into.
pub struct Partition {
    /// Levels at or above the match point whose params didn't change.
    /// `setup`/`enter` are not re-run for these.
    pub unchanged: Vec<HandlerInfo>,
    /// Levels at or above the match point whose params changed — `setup`
    /// runs again, but `enter` does not (the handler stayed active).
    pub updated_context: Vec<HandlerInfo>,
    /// Levels at and below the match point in the candidate chain — these
    /// get full validation (`beforeModel`/`model`/`afterModel`) and `enter`.
    pub entered: Vec<HandlerInfo>,
    /// Levels at and below the match point in the active chain that aren't
    /// present in the candidate — these get `exit`, deepest first.
    pub exited: Vec<HandlerInfo>,
}

/// Split `active` and `candidate` using a precomputed `MatchPoint`.
pub fn partition(active: &[HandlerInfo], candidate: &[HandlerInfo], match_point: &MatchPoint) -> Partition {
    let mut unchanged = Vec::new();
    let mut updated_context = Vec::new();

    for (level, agreement) in match_point.agreements.iter().enumerate() {
        match agreement {
            LevelAgreement::Same => unchanged.push(candidate[level].clone()),
            LevelAgreement::ContextChanged => updated_context.push(candidate[level].clone()),
            LevelAgreement::HandlerChanged => unreachable!("match point never records HandlerChanged levels"),
        }
    }

    let entered = candidate[match_point.index..].to_vec();

    let mut exited: Vec<HandlerInfo> = active[match_point.index..].to_vec();
    exited.reverse();

    Partition {
        unchanged,
        updated_context,
        entered,
        exited,
    }
}
