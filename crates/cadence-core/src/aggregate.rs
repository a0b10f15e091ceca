//! Per-project rollups of planned and logged effort.
//!
//! Archived items never count. Done items contribute the larger of their
//! planned and logged minutes to `done_planned_min`, so a project whose
//! finished work overran its plan reports `progress_pct` above 100.

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Project, SessionRecord, WorkItem, WorkItemStatus};

/// Trailing window used to measure the user's recent pace.
pub const PACE_WINDOW_DAYS: i64 = 7;

/// Rollup for one project at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectAggregate {
    pub project_id: String,
    pub project_name: String,
    pub start_date: NaiveDate,
    pub target_date: Option<NaiveDate>,
    pub planned_min: i64,
    pub logged_min: i64,
    pub done_planned_min: i64,
    /// done_planned / planned, on a 0-100 scale; may exceed 100
    pub progress_pct: f64,
    /// Share of the start..target span already elapsed, 0-100
    pub time_elapsed_pct: f64,
    /// Share of planned minutes whose due date has passed, 0-100
    pub due_based_expected_pct: f64,
    pub item_count: usize,
    pub open_item_count: usize,
}

impl ProjectAggregate {
    /// Build the rollup from every item of `project` in `items`.
    pub fn compute(project: &Project, items: &[WorkItem], today: NaiveDate) -> Self {
        let mut planned = 0i64;
        let mut logged = 0i64;
        let mut done_planned = 0i64;
        let mut overdue_planned = 0i64;
        let mut item_count = 0usize;
        let mut open_item_count = 0usize;

        for item in items
            .iter()
            .filter(|i| i.project_id == project.id && i.status != WorkItemStatus::Archived)
        {
            item_count += 1;
            planned = planned.saturating_add(item.planned_min);
            logged = logged.saturating_add(item.logged_min);
            match item.status {
                WorkItemStatus::Done => {
                    done_planned = done_planned.saturating_add(item.planned_min.max(item.logged_min));
                }
                WorkItemStatus::Skipped => {
                    done_planned = done_planned.saturating_add(item.planned_min);
                }
                _ => open_item_count += 1,
            }
            if item.effective_due_date().is_some_and(|due| due < today) {
                overdue_planned = overdue_planned.saturating_add(item.planned_min);
            }
        }

        let pct = |part: i64| {
            if planned > 0 {
                part as f64 / planned as f64 * 100.0
            } else {
                0.0
            }
        };

        Self {
            project_id: project.id.clone(),
            project_name: project.name.clone(),
            start_date: project.start_date,
            target_date: project.target_date,
            planned_min: planned,
            logged_min: logged,
            done_planned_min: done_planned,
            progress_pct: pct(done_planned),
            time_elapsed_pct: time_elapsed_pct(project.start_date, project.target_date, today),
            due_based_expected_pct: pct(overdue_planned),
            item_count,
            open_item_count,
        }
    }

    /// Minutes of plan not yet covered by logged time.
    pub fn remaining_min(&self) -> i64 {
        (self.planned_min - self.logged_min).max(0)
    }
}

fn time_elapsed_pct(start: NaiveDate, target: Option<NaiveDate>, today: NaiveDate) -> f64 {
    let Some(target) = target else {
        return 0.0;
    };
    let span = (target - start).num_days();
    if span <= 0 {
        return if today >= target { 100.0 } else { 0.0 };
    }
    let elapsed = (today - start).num_days();
    (elapsed as f64 / span as f64 * 100.0).clamp(0.0, 100.0)
}

/// Aggregate every non-archived project, in snapshot order.
pub fn aggregate_projects(
    projects: &[Project],
    items: &[WorkItem],
    today: NaiveDate,
) -> Vec<ProjectAggregate> {
    projects
        .iter()
        .filter(|p| !p.archived)
        .map(|p| ProjectAggregate::compute(p, items, today))
        .collect()
}

/// Average minutes per day logged on each project over the trailing window.
pub fn trailing_daily_pace(sessions: &[SessionRecord], now: DateTime<Utc>) -> HashMap<String, f64> {
    let window_start = now - Duration::days(PACE_WINDOW_DAYS);
    let mut totals: HashMap<String, i64> = HashMap::new();
    for s in sessions
        .iter()
        .filter(|s| s.started_at >= window_start && s.started_at < now)
    {
        let total = totals.entry(s.project_id.clone()).or_default();
        *total = total.saturating_add(s.minutes.max(0));
    }
    totals
        .into_iter()
        .map(|(project, minutes)| (project, minutes as f64 / PACE_WINDOW_DAYS as f64))
        .collect()
}
