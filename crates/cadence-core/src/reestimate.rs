//! Smoothing re-estimation of planned minutes from unit progress.
//!
//! ```text
//! implied = logged / units_done × units_total
//! new     = 0.7 × planned + 0.3 × implied
//! ```
//!
//! The blend is evaluated in exact integer arithmetic and rounded toward
//! `implied` (up when growing, down when shrinking) without stepping past it,
//! then floored at the logged minutes. The implied total, rounded to whole
//! minutes, is therefore reached exactly and is a fixed point: once there,
//! further runs report no change.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{DurationMode, WorkItem, WorkItemStatus};

/// Weight kept on the previous estimate, in tenths.
const PRIOR_TENTHS: i128 = 7;
/// Weight given to the pace-implied total, in tenths.
const IMPLIED_TENTHS: i128 = 3;

/// A planned-minutes update produced by re-estimation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedChange {
    pub work_item_id: String,
    pub project_id: String,
    pub old_planned_min: i64,
    pub new_planned_min: i64,
}

/// Re-estimates unit-tracked work items.
pub struct ReEstimator;

impl ReEstimator {
    /// Unit-tracked estimate with some units done, still open.
    pub fn is_eligible(item: &WorkItem) -> bool {
        item.duration_mode == DurationMode::Estimate
            && item.units_total.is_some_and(|t| t > 0)
            && item.units_done.is_some_and(|d| d > 0)
            && !matches!(
                item.status,
                WorkItemStatus::Done | WorkItemStatus::Skipped | WorkItemStatus::Archived
            )
    }

    /// Total minutes the current pace implies, if the item is eligible.
    pub fn implied_total(item: &WorkItem) -> Option<f64> {
        if !Self::is_eligible(item) {
            return None;
        }
        let total = item.units_total? as f64;
        let done = item.units_done? as f64;
        Some(item.logged_min as f64 / done * total)
    }

    /// The change for one item, or None when ineligible or already settled.
    pub fn reestimate(item: &WorkItem) -> Option<PlannedChange> {
        if !Self::is_eligible(item) {
            return None;
        }
        let new = smoothed_planned(
            item.planned_min,
            item.logged_min,
            item.units_total?,
            item.units_done?,
        );
        (new != item.planned_min).then(|| PlannedChange {
            work_item_id: item.id.clone(),
            project_id: item.project_id.clone(),
            old_planned_min: item.planned_min,
            new_planned_min: new,
        })
    }

    /// Re-estimate every eligible item in place, returning what changed.
    pub fn apply_all<'a, I>(items: I) -> Vec<PlannedChange>
    where
        I: IntoIterator<Item = &'a mut WorkItem>,
    {
        let mut changes = Vec::new();
        for item in items {
            if let Some(change) = Self::reestimate(item) {
                debug!(
                    work_item = %change.work_item_id,
                    old = change.old_planned_min,
                    new = change.new_planned_min,
                    "re-estimated"
                );
                item.planned_min = change.new_planned_min;
                changes.push(change);
            }
        }
        changes
    }
}

/// One smoothing step. `units_done` must be positive.
pub fn smoothed_planned(planned: i64, logged: i64, units_total: u32, units_done: u32) -> i64 {
    let done = i128::from(units_done.max(1));
    let implied_numerator = i128::from(logged) * i128::from(units_total);
    // implied total rounded half-up
    let target = (2 * implied_numerator + done) / (2 * done);
    let current = i128::from(planned);

    let numerator = PRIOR_TENTHS * current * done + IMPLIED_TENTHS * implied_numerator;
    let denominator = 10 * done;

    let next = if current < target {
        let ceil = numerator.div_euclid(denominator)
            + i128::from(numerator.rem_euclid(denominator) != 0);
        ceil.min(target)
    } else if current > target {
        numerator.div_euclid(denominator).max(target)
    } else {
        current
    };
    i64::try_from(next).unwrap_or(i64::MAX).max(logged)
}
