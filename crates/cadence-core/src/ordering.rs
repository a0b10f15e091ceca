//! Canonical ordering of scored candidates.
//!
//! Keys, compared in turn:
//! 1. project risk, critical first
//! 2. project target date, earlier first, undated last
//! 3. score, descending
//! 4. item title, then project name
//! 5. work item id
//!
//! The id makes this a strict total order, so the result does not depend on
//! the order candidates arrived in. Allocation consumes this order as-is.

use std::cmp::Ordering;

use crate::scoring::ScoredCandidate;

/// Compare two scored candidates in canonical order.
pub fn canonical_cmp(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    b.risk_level
        .cmp(&a.risk_level)
        .then_with(|| {
            match (
                a.candidate.project_target_date,
                b.candidate.project_target_date,
            ) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        })
        .then_with(|| b.score.total_cmp(&a.score))
        .then_with(|| a.candidate.title.cmp(&b.candidate.title))
        .then_with(|| a.candidate.project_name.cmp(&b.candidate.project_name))
        .then_with(|| a.candidate.work_item_id.cmp(&b.candidate.work_item_id))
}

/// Sort candidates into canonical order in place.
pub fn sort_canonical(candidates: &mut [ScoredCandidate]) {
    candidates.sort_by(canonical_cmp);
}
