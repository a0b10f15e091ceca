//! Deadline risk classification.
//!
//! ```text
//! remaining      = max(planned − logged, 0)
//! days_remaining = max(target_end − now, 0.1 day)
//! required_daily = remaining / days_remaining × (1 + buffer)
//! ```
//!
//! | Condition | Level |
//! |-----------|-------|
//! | pace < 95% of required AND (due lag > 20 pts OR < 2 days left) | Critical |
//! | pace < 95% of required, OR elapsed lag > 15 pts | AtRisk |
//! | otherwise | OnTrack |
//!
//! Without a target date nothing is required per day; the project is only
//! flagged AtRisk when sub-items with their own due dates are overdue.
//!
//! Classification of one project never looks at another.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::aggregate::ProjectAggregate;
use crate::model::{days_between, end_of_day};
use crate::profile::UserProfile;

/// Pace must reach this share of the required pace to count as covering it.
pub const PACE_MARGIN: f64 = 0.95;
/// Points by which due-based expectation may lead progress before critical.
pub const CRITICAL_LAG_PCT: f64 = 20.0;
/// Points by which elapsed time may lead progress before at-risk.
pub const AT_RISK_LAG_PCT: f64 = 15.0;
/// Points of overdue sub-items that flag a project without a target date.
pub const OVERDUE_LAG_PCT: f64 = 10.0;
/// Deadlines closer than this many days are imminent.
pub const IMMINENT_DAYS: f64 = 2.0;
/// Floor on days remaining so required pace stays finite.
pub const MIN_DAYS_REMAINING: f64 = 0.1;

/// Risk level of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    OnTrack,
    AtRisk,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::OnTrack => "on_track",
            RiskLevel::AtRisk => "at_risk",
            RiskLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the classifier looks at for one project.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskInput {
    pub now: DateTime<Utc>,
    pub target_date: Option<NaiveDate>,
    pub planned_min: i64,
    pub logged_min: i64,
    /// Fraction, e.g. 0.15
    pub buffer_pct: f64,
    /// max(trailing 7-day pace, baseline daily commitment)
    pub effective_daily_min: f64,
    pub progress_pct: f64,
    pub time_elapsed_pct: f64,
    pub due_based_expected_pct: f64,
}

impl RiskInput {
    /// Assemble the input for a project from its rollup and recent pace.
    pub fn from_aggregate(
        aggregate: &ProjectAggregate,
        now: DateTime<Utc>,
        profile: &UserProfile,
        trailing_daily_min: f64,
    ) -> Self {
        Self {
            now,
            target_date: aggregate.target_date,
            planned_min: aggregate.planned_min,
            logged_min: aggregate.logged_min,
            buffer_pct: profile.buffer_pct,
            effective_daily_min: trailing_daily_min.max(profile.baseline_daily_min as f64),
            progress_pct: aggregate.progress_pct,
            time_elapsed_pct: aggregate.time_elapsed_pct,
            due_based_expected_pct: aggregate.due_based_expected_pct,
        }
    }
}

/// Outcome of classifying one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskResult {
    pub level: RiskLevel,
    pub required_daily_min: f64,
    pub remaining_min: i64,
    /// Days until the end of the target date, floored; None without a target
    pub days_remaining: Option<f64>,
}

impl RiskResult {
    fn on_track(remaining_min: i64) -> Self {
        Self {
            level: RiskLevel::OnTrack,
            required_daily_min: 0.0,
            remaining_min,
            days_remaining: None,
        }
    }
}

/// Pure deadline-risk classifier.
pub struct RiskClassifier;

impl RiskClassifier {
    /// Classify a single project.
    pub fn classify(input: &RiskInput) -> RiskResult {
        if input.planned_min <= 0 {
            return RiskResult::on_track(0);
        }
        let remaining = (input.planned_min - input.logged_min).max(0);
        let due_lag = input.due_based_expected_pct - input.progress_pct;

        let Some(target) = input.target_date else {
            let mut result = RiskResult::on_track(remaining);
            if due_lag > OVERDUE_LAG_PCT {
                result.level = RiskLevel::AtRisk;
            }
            return result;
        };

        let days = days_between(input.now, end_of_day(target)).max(MIN_DAYS_REMAINING);
        let required = remaining as f64 / days * (1.0 + input.buffer_pct);

        let pace_short = required > 0.0 && input.effective_daily_min < required * PACE_MARGIN;
        let imminent = days < IMMINENT_DAYS && remaining > 0;
        let elapsed_lag = input.time_elapsed_pct - input.progress_pct;

        let level = if pace_short && (due_lag > CRITICAL_LAG_PCT || imminent) {
            RiskLevel::Critical
        } else if pace_short || elapsed_lag > AT_RISK_LAG_PCT {
            RiskLevel::AtRisk
        } else {
            RiskLevel::OnTrack
        };

        RiskResult {
            level,
            required_daily_min: required,
            remaining_min: remaining,
            days_remaining: Some(days),
        }
    }
}
