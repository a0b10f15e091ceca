//! Planning types for projects, work items, sessions and candidates.
//!
//! `Project`, `WorkItem` and `SessionRecord` mirror what the storage layer
//! holds. `Candidate` is the joined view the engine consumes: one schedulable
//! work item with its project context and recency already resolved.

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Work item status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum WorkItemStatus {
    /// Not started
    #[default]
    Todo,
    /// Some time logged
    InProgress,
    /// Finished (terminal)
    Done,
    /// Deliberately not done (terminal)
    Skipped,
    /// Hidden from aggregates and scheduling
    Archived,
}

impl WorkItemStatus {
    /// Statuses the engine may offer time to.
    pub fn is_schedulable(&self) -> bool {
        matches!(self, WorkItemStatus::Todo | WorkItemStatus::InProgress)
    }

    /// Whether a dependency on an item in this status is satisfied.
    pub fn satisfies_dependency(&self) -> bool {
        matches!(
            self,
            WorkItemStatus::Done | WorkItemStatus::Skipped | WorkItemStatus::Archived
        )
    }
}

/// How a work item's planned minutes are treated.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DurationMode {
    /// Planned minutes are a guess and may be re-estimated from progress
    #[default]
    Estimate,
    /// Planned minutes are fixed (e.g. a lecture of known length)
    Fixed,
}

/// A project that groups work items under one deadline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub target_date: Option<NaiveDate>,
    #[serde(default)]
    pub archived: bool,
}

/// A unit of work as stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkItem {
    pub id: String,
    pub project_id: String,
    /// Owning structural node (chapter, milestone, ...)
    pub node_id: String,
    pub title: String,
    #[serde(default)]
    pub status: WorkItemStatus,
    pub planned_min: i64,
    #[serde(default)]
    pub logged_min: i64,
    pub min_session_min: i64,
    pub max_session_min: i64,
    pub preferred_session_min: i64,
    #[serde(default)]
    pub not_before: Option<NaiveDate>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    /// Due date of the owning node, used when the item has none of its own
    #[serde(default)]
    pub inherited_due_date: Option<NaiveDate>,
    #[serde(default)]
    pub units_total: Option<u32>,
    #[serde(default)]
    pub units_done: Option<u32>,
    #[serde(default)]
    pub duration_mode: DurationMode,
    #[serde(default)]
    pub depends_on: Vec<String>,
}

impl WorkItem {
    /// Own due date, falling back to the inherited one.
    pub fn effective_due_date(&self) -> Option<NaiveDate> {
        self.due_date.or(self.inherited_due_date)
    }

    /// Reject negative minutes and inverted session bounds.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_minutes(
            &self.id,
            self.planned_min,
            self.logged_min,
            self.min_session_min,
            self.max_session_min,
        )
    }
}

/// Longest session accepted from a snapshot, in minutes.
pub const MAX_SESSION_MIN: i64 = 24 * 60;

/// A logged work session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionRecord {
    pub work_item_id: String,
    pub project_id: String,
    pub started_at: DateTime<Utc>,
    pub minutes: i64,
}

impl SessionRecord {
    /// Instant the session ended, or None if it falls outside the calendar.
    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        TimeDelta::try_minutes(self.minutes.max(0))
            .and_then(|length| self.started_at.checked_add_signed(length))
    }

    /// Reject lengths that are negative, longer than a day, or unrepresentable.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(0..=MAX_SESSION_MIN).contains(&self.minutes) || self.ended_at().is_none() {
            return Err(ValidationError::SessionLength {
                work_item_id: self.work_item_id.clone(),
                minutes: self.minutes,
                max: MAX_SESSION_MIN,
            });
        }
        Ok(())
    }
}

/// A schedulable work item joined with its project context.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candidate {
    pub work_item_id: String,
    pub node_id: String,
    pub project_id: String,
    pub title: String,
    pub project_name: String,
    #[serde(default)]
    pub project_target_date: Option<NaiveDate>,
    pub planned_min: i64,
    pub logged_min: i64,
    pub min_session_min: i64,
    pub max_session_min: i64,
    pub preferred_session_min: i64,
    #[serde(default)]
    pub not_before: Option<NaiveDate>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub units_total: Option<u32>,
    #[serde(default)]
    pub units_done: Option<u32>,
    #[serde(default)]
    pub duration_mode: DurationMode,
    pub dependencies_met: bool,
    #[serde(default)]
    pub last_worked_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub project_last_worked_at: Option<DateTime<Utc>>,
}

impl Candidate {
    /// Minutes still wanted before the item is complete.
    pub fn remaining_min(&self) -> i64 {
        (self.planned_min - self.logged_min).max(0)
    }

    /// Logged time has reached the plan.
    pub fn is_complete(&self) -> bool {
        self.logged_min >= self.planned_min
    }

    /// Earliest of the item's own due date and its project's target date.
    pub fn nearest_deadline(&self) -> Option<NaiveDate> {
        match (self.due_date, self.project_target_date) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Reject malformed values before any stage runs.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_minutes(
            &self.work_item_id,
            self.planned_min,
            self.logged_min,
            self.min_session_min,
            self.max_session_min,
        )
    }
}

fn check_minutes(
    id: &str,
    planned_min: i64,
    logged_min: i64,
    min_session_min: i64,
    max_session_min: i64,
) -> Result<(), ValidationError> {
    for (field, value) in [
        ("planned_min", planned_min),
        ("logged_min", logged_min),
        ("min_session_min", min_session_min),
    ] {
        if value < 0 {
            return Err(ValidationError::NegativeMinutes {
                id: id.to_string(),
                field,
                value,
            });
        }
    }
    if min_session_min > max_session_min {
        return Err(ValidationError::SessionBounds {
            id: id.to_string(),
            min: min_session_min,
            max: max_session_min,
        });
    }
    Ok(())
}

/// End of the given day in UTC; date-only deadlines mean "by the end of".
pub fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    let next = date.succ_opt().unwrap_or(date);
    next.and_time(chrono::NaiveTime::MIN).and_utc()
}

/// Fractional days from `from` to `to` (negative when `to` is earlier).
pub fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_seconds() as f64 / 86_400.0
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn remaining_and_completion() {
        let mut c = candidate("a", "p");
        c.planned_min = 90;
        c.logged_min = 30;
        assert_eq!(c.remaining_min(), 60);
        assert!(!c.is_complete());

        c.logged_min = 120;
        assert_eq!(c.remaining_min(), 0);
        assert!(c.is_complete());
    }

    #[test]
    fn nearest_deadline_prefers_earlier_date() {
        let mut c = candidate("a", "p");
        assert_eq!(c.nearest_deadline(), None);
        c.project_target_date = Some(date("2026-11-30"));
        assert_eq!(c.nearest_deadline(), Some(date("2026-11-30")));
        c.due_date = Some(date("2026-11-02"));
        assert_eq!(c.nearest_deadline(), Some(date("2026-11-02")));
    }

    #[test]
    fn validate_rejects_inverted_session_bounds() {
        let mut c = candidate("a", "p");
        c.min_session_min = 90;
        c.max_session_min = 30;
        assert!(matches!(
            c.validate(),
            Err(ValidationError::SessionBounds { min: 90, max: 30, .. })
        ));
    }

    #[test]
    fn validate_rejects_negative_logged() {
        let mut c = candidate("a", "p");
        c.logged_min = -1;
        assert!(matches!(
            c.validate(),
            Err(ValidationError::NegativeMinutes { field: "logged_min", .. })
        ));
    }

    #[test]
    fn work_item_validate_rejects_negative_minutes() {
        assert!(work_item("w", "p", 100, 0).validate().is_ok());

        let item = work_item("w", "p", 100, -60);
        assert_eq!(
            item.validate(),
            Err(ValidationError::NegativeMinutes {
                id: "w".into(),
                field: "logged_min",
                value: -60,
            })
        );

        let item = work_item("w", "p", -5, 0);
        assert!(matches!(
            item.validate(),
            Err(ValidationError::NegativeMinutes { field: "planned_min", .. })
        ));
    }

    #[test]
    fn work_item_validate_rejects_inverted_session_bounds() {
        let mut item = work_item("w", "p", 100, 0);
        item.min_session_min = 45;
        item.max_session_min = 20;
        assert!(matches!(
            item.validate(),
            Err(ValidationError::SessionBounds { min: 45, max: 20, .. })
        ));
    }

    fn session(minutes: i64) -> SessionRecord {
        SessionRecord {
            work_item_id: "w".into(),
            project_id: "p".into(),
            started_at: at("2026-10-16T09:00:00Z"),
            minutes,
        }
    }

    #[test]
    fn session_end_is_checked() {
        assert_eq!(session(30).ended_at(), Some(at("2026-10-16T09:30:00Z")));
        assert_eq!(session(i64::MAX).ended_at(), None);
    }

    #[test]
    fn session_validate_bounds_length() {
        assert!(session(0).validate().is_ok());
        assert!(session(MAX_SESSION_MIN).validate().is_ok());
        for minutes in [-1, MAX_SESSION_MIN + 1, i64::MAX] {
            assert!(matches!(
                session(minutes).validate(),
                Err(ValidationError::SessionLength { .. })
            ));
        }
    }

    #[test]
    fn end_of_day_is_next_midnight() {
        assert_eq!(end_of_day(date("2026-10-16")), at("2026-10-17T00:00:00Z"));
    }

    #[test]
    fn effective_due_falls_back_to_node() {
        let mut item = work_item("w", "p", 60, 0);
        item.inherited_due_date = Some(date("2026-12-01"));
        assert_eq!(item.effective_due_date(), Some(date("2026-12-01")));
        item.due_date = Some(date("2026-11-01"));
        assert_eq!(item.effective_due_date(), Some(date("2026-11-01")));
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&WorkItemStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }
}
