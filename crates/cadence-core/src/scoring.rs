//! Multi-factor candidate scoring.
//!
//! Each factor yields a raw value, is multiplied by its weight from the
//! profile, and the contributions are summed. Five factors live in `[0, 1]`;
//! spacing is signed in `[-1, 1]` so that repeating an item within a few hours
//! is penalized.
//!
//! | Factor | Raw value |
//! |--------|-----------|
//! | Deadline pressure | `0.1·W/d` beyond the window, `0.1 + 0.9·(1 − d/W)²` inside, 1 when overdue |
//! | Risk elevation | 0 / 0.5 / 1 for on_track / at_risk / critical |
//! | Spacing | −1 → 0 over the first half day since last worked, then 0 → 1 over 3 days |
//! | Variation | 0 → 1 over 2 days since the project was last worked |
//! | Progress lag | project progress − item logged ratio, clamped to `[0, 1]` |
//! | Session fit | closeness of preferred session to available time, halved when the minimum barely fits |
//!
//! Reasons are emitted in that order for every contribution whose magnitude
//! reaches [`NEGLIGIBLE_CONTRIBUTION`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{days_between, end_of_day, Candidate};
use crate::profile::ScoringWeights;
use crate::risk::{RiskLevel, RiskResult};

/// Width of the deadline window in days.
pub const DEADLINE_WINDOW_DAYS: f64 = 14.0;
/// Repeats closer than this (days) are penalized.
pub const SPACING_MIN_GAP_DAYS: f64 = 0.5;
/// Days past the minimum gap at which the spacing bonus saturates.
pub const SPACING_SATURATION_DAYS: f64 = 3.0;
/// Days since a project was last worked at which variation saturates.
pub const VARIATION_SATURATION_DAYS: f64 = 2.0;
/// Minimum share of available time taken by `min_session_min` that counts as barely fitting.
pub const BARELY_FITS_RATIO: f64 = 0.8;
/// Contributions smaller than this produce no reason.
pub const NEGLIGIBLE_CONTRIBUTION: f64 = 0.005;

/// Why a candidate scored what it did; one variant per factor, carrying the
/// weighted contribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "code", content = "contribution", rename_all = "snake_case")]
pub enum Reason {
    DeadlinePressure(f64),
    RiskElevation(f64),
    Spacing(f64),
    CrossProjectVariation(f64),
    ProgressLag(f64),
    SessionFit(f64),
}

impl Reason {
    pub fn code(&self) -> &'static str {
        match self {
            Reason::DeadlinePressure(_) => "deadline_pressure",
            Reason::RiskElevation(_) => "risk_elevation",
            Reason::Spacing(_) => "spacing",
            Reason::CrossProjectVariation(_) => "cross_project_variation",
            Reason::ProgressLag(_) => "progress_lag",
            Reason::SessionFit(_) => "session_fit",
        }
    }

    pub fn contribution(&self) -> f64 {
        match *self {
            Reason::DeadlinePressure(c)
            | Reason::RiskElevation(c)
            | Reason::Spacing(c)
            | Reason::CrossProjectVariation(c)
            | Reason::ProgressLag(c)
            | Reason::SessionFit(c) => c,
        }
    }

    /// Short human explanation.
    pub fn describe(&self) -> String {
        let text = match self {
            Reason::DeadlinePressure(_) => "deadline approaching",
            Reason::RiskElevation(_) => "project is behind schedule",
            Reason::Spacing(c) if *c < 0.0 => "worked on very recently",
            Reason::Spacing(_) => "not worked on for a while",
            Reason::CrossProjectVariation(_) => "project has been idle",
            Reason::ProgressLag(_) => "lagging the rest of its project",
            Reason::SessionFit(_) => "fits the available time",
        };
        format!("{text} ({:+.2})", self.contribution())
    }
}

/// A candidate with its score and explanation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    pub risk_level: RiskLevel,
    pub score: f64,
    pub reasons: Vec<Reason>,
}

/// Context for scoring one candidate
#[derive(Debug, Clone)]
pub struct ScoringContext<'a> {
    /// The candidate being scored
    pub candidate: &'a Candidate,
    /// Its project's risk
    pub risk: &'a RiskResult,
    /// Its project's aggregate progress, 0-100
    pub project_progress_pct: f64,
    /// Minutes the user has right now
    pub available_min: i64,
    pub now: DateTime<Utc>,
    pub weights: ScoringWeights,
}

/// Stateless scorer; weights travel in the context.
pub struct Scorer;

impl Scorer {
    /// Score a single candidate in context
    pub fn score(ctx: &ScoringContext) -> ScoredCandidate {
        let w = &ctx.weights;
        let c = ctx.candidate;
        let terms = [
            Reason::DeadlinePressure(w.deadline * deadline_pressure(c, ctx.now)),
            Reason::RiskElevation(w.risk * risk_elevation(ctx.risk.level)),
            Reason::Spacing(w.spacing * spacing(c, ctx.now)),
            Reason::CrossProjectVariation(w.variation * variation(c, ctx.now)),
            Reason::ProgressLag(w.progress * progress_lag(c, ctx.project_progress_pct)),
            Reason::SessionFit(w.session_fit * session_fit(c, ctx.available_min)),
        ];

        let score = terms.iter().map(Reason::contribution).sum();
        let reasons = terms
            .into_iter()
            .filter(|r| r.contribution().abs() >= NEGLIGIBLE_CONTRIBUTION)
            .collect();

        ScoredCandidate {
            candidate: c.clone(),
            risk_level: ctx.risk.level,
            score,
            reasons,
        }
    }
}

pub(crate) fn deadline_pressure(c: &Candidate, now: DateTime<Utc>) -> f64 {
    let Some(deadline) = c.nearest_deadline() else {
        return 0.0;
    };
    let days = days_between(now, end_of_day(deadline));
    if days <= 0.0 {
        return 1.0;
    }
    if days >= DEADLINE_WINDOW_DAYS {
        0.1 * DEADLINE_WINDOW_DAYS / days
    } else {
        let closeness = 1.0 - days / DEADLINE_WINDOW_DAYS;
        0.1 + 0.9 * closeness * closeness
    }
}

pub(crate) fn risk_elevation(level: RiskLevel) -> f64 {
    match level {
        RiskLevel::OnTrack => 0.0,
        RiskLevel::AtRisk => 0.5,
        RiskLevel::Critical => 1.0,
    }
}

pub(crate) fn spacing(c: &Candidate, now: DateTime<Utc>) -> f64 {
    let Some(last) = c.last_worked_at else {
        return 1.0;
    };
    let days = days_between(last, now).max(0.0);
    if days < SPACING_MIN_GAP_DAYS {
        -(1.0 - days / SPACING_MIN_GAP_DAYS)
    } else {
        ((days - SPACING_MIN_GAP_DAYS) / SPACING_SATURATION_DAYS).min(1.0)
    }
}

pub(crate) fn variation(c: &Candidate, now: DateTime<Utc>) -> f64 {
    let Some(last) = c.project_last_worked_at else {
        return 1.0;
    };
    (days_between(last, now).max(0.0) / VARIATION_SATURATION_DAYS).min(1.0)
}

pub(crate) fn progress_lag(c: &Candidate, project_progress_pct: f64) -> f64 {
    if c.planned_min <= 0 {
        return 0.0;
    }
    let item_ratio = c.logged_min as f64 / c.planned_min as f64;
    let project_ratio = (project_progress_pct / 100.0).min(1.0);
    (project_ratio - item_ratio).clamp(0.0, 1.0)
}

pub(crate) fn session_fit(c: &Candidate, available_min: i64) -> f64 {
    if available_min <= 0 || c.min_session_min > available_min {
        return 0.0;
    }
    let preferred = c.preferred_session_min.max(1) as f64;
    let available = available_min as f64;
    let mut fit = 1.0 - (preferred - available).abs() / preferred.max(available);
    if c.min_session_min as f64 > BARELY_FITS_RATIO * available {
        fit *= 0.5;
    }
    fit.clamp(0.0, 1.0)
}
