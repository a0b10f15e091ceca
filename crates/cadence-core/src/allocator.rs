//! Two-pass time allocation over canonically sorted candidates.
//!
//! - **Pass 1** gives each project its first eligible candidate that fits,
//!   sized to the preferred session.
//! - **Pass 2** walks the list again from the top, growing existing slices
//!   toward their maximum and opening new ones until the budget runs out.
//!
//! Every slice satisfies `min_session ≤ allocated ≤ max_session` and
//! `allocated ≤ planned − logged`. A candidate that gets no slice reports
//! exactly one [`Blocker`].

use std::collections::{HashMap, HashSet};
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::risk::RiskLevel;
use crate::scoring::{Reason, ScoredCandidate};

/// Global scheduling posture for one recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Any project may receive time
    Balanced,
    /// Only critical-risk projects may receive time
    Critical,
}

impl Mode {
    /// Critical when any project is critical.
    pub fn from_levels<I: IntoIterator<Item = RiskLevel>>(levels: I) -> Self {
        if levels.into_iter().any(|l| l == RiskLevel::Critical) {
            Mode::Critical
        } else {
            Mode::Balanced
        }
    }

    pub fn admits(&self, level: RiskLevel) -> bool {
        match self {
            Mode::Balanced => true,
            Mode::Critical => level == RiskLevel::Critical,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Balanced => "balanced",
            Mode::Critical => "critical",
        })
    }
}

/// Why a candidate received no time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockerCode {
    NotBefore,
    Dependency,
    NotInCriticalScope,
    SessionMinExceedsAvailable,
    WorkComplete,
    /// Reserved: done items are filtered before they reach the engine
    StatusDone,
}

impl BlockerCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockerCode::NotBefore => "not_before",
            BlockerCode::Dependency => "dependency",
            BlockerCode::NotInCriticalScope => "not_in_critical_scope",
            BlockerCode::SessionMinExceedsAvailable => "session_min_exceeds_available",
            BlockerCode::WorkComplete => "work_complete",
            BlockerCode::StatusDone => "status_done",
        }
    }
}

impl fmt::Display for BlockerCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A candidate that produced no slice, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blocker {
    pub entity_id: String,
    pub code: BlockerCode,
    pub message: String,
}

impl Blocker {
    pub fn new(entity_id: impl Into<String>, code: BlockerCode, message: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            code,
            message: message.into(),
        }
    }
}

/// One allocation of minutes to one work item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkSlice {
    pub work_item_id: String,
    pub project_id: String,
    pub title: String,
    pub project_name: String,
    pub allocated_min: i64,
    pub score: f64,
    pub reasons: Vec<Reason>,
}

/// Result of one allocation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub slices: Vec<WorkSlice>,
    pub blockers: Vec<Blocker>,
    pub total_allocated_min: i64,
    pub unallocated_min: i64,
}

/// Allocates available minutes across sorted candidates.
pub struct Allocator {
    available_min: i64,
    mode: Mode,
    today: NaiveDate,
}

impl Allocator {
    pub fn new(available_min: i64, mode: Mode, today: NaiveDate) -> Self {
        Self {
            available_min: available_min.max(0),
            mode,
            today,
        }
    }

    /// First applicable reason a candidate cannot be considered at all.
    fn static_blocker(&self, sc: &ScoredCandidate) -> Option<Blocker> {
        let c = &sc.candidate;
        let id = c.work_item_id.as_str();
        if let Some(date) = c.not_before.filter(|d| *d > self.today) {
            return Some(Blocker::new(
                id,
                BlockerCode::NotBefore,
                format!("'{}' is not available until {date}", c.title),
            ));
        }
        if !c.dependencies_met {
            return Some(Blocker::new(
                id,
                BlockerCode::Dependency,
                format!("'{}' is waiting on unfinished dependencies", c.title),
            ));
        }
        if !self.mode.admits(sc.risk_level) {
            return Some(Blocker::new(
                id,
                BlockerCode::NotInCriticalScope,
                format!(
                    "'{}' belongs to {} project '{}' while only critical projects are scheduled",
                    c.title, sc.risk_level, c.project_name
                ),
            ));
        }
        if !c.is_complete() && c.min_session_min > self.available_min {
            return Some(Blocker::new(
                id,
                BlockerCode::SessionMinExceedsAvailable,
                format!(
                    "'{}' needs at least {} min but only {} min are available",
                    c.title, c.min_session_min, self.available_min
                ),
            ));
        }
        if c.is_complete() {
            return Some(Blocker::new(
                id,
                BlockerCode::WorkComplete,
                format!(
                    "'{}' already has {} of {} planned min logged",
                    c.title, c.logged_min, c.planned_min
                ),
            ));
        }
        None
    }

    /// Allocate over candidates already in canonical order.
    pub fn allocate(&self, sorted: &[ScoredCandidate]) -> Allocation {
        let mut blockers = Vec::new();
        let mut eligible = Vec::with_capacity(sorted.len());
        for (idx, sc) in sorted.iter().enumerate() {
            match self.static_blocker(sc) {
                Some(b) => blockers.push((idx, b)),
                None => eligible.push(idx),
            }
        }

        let mut budget = self.available_min;
        let mut allocated: HashMap<usize, i64> = HashMap::new();

        // Pass 1: one slice per project at its preferred length.
        let mut represented: HashSet<&str> = HashSet::new();
        for &idx in &eligible {
            let c = &sorted[idx].candidate;
            if represented.contains(c.project_id.as_str()) {
                continue;
            }
            let amount = c
                .preferred_session_min
                .max(c.min_session_min)
                .min(c.max_session_min)
                .min(c.remaining_min())
                .min(budget);
            if amount > 0 && amount >= c.min_session_min {
                budget -= amount;
                allocated.insert(idx, amount);
                represented.insert(c.project_id.as_str());
            }
        }
        debug!(projects = represented.len(), budget, "variation pass done");

        // Pass 2: fill from the top.
        for &idx in &eligible {
            if budget <= 0 {
                break;
            }
            let c = &sorted[idx].candidate;
            let need = c.remaining_min();
            match allocated.get(&idx).copied() {
                Some(current) => {
                    let extra = (c.max_session_min - current).min(need - current).min(budget);
                    if extra > 0 {
                        budget -= extra;
                        allocated.insert(idx, current + extra);
                    }
                }
                None => {
                    let amount = c.max_session_min.min(need).min(budget);
                    if amount > 0 && amount >= c.min_session_min {
                        budget -= amount;
                        allocated.insert(idx, amount);
                    }
                }
            }
        }
        debug!(slices = allocated.len(), budget, "fill pass done");

        for &idx in &eligible {
            if allocated.contains_key(&idx) {
                continue;
            }
            let c = &sorted[idx].candidate;
            let message = if c.remaining_min() < c.min_session_min {
                format!(
                    "'{}' has {} min left, below its {} min minimum session",
                    c.title,
                    c.remaining_min(),
                    c.min_session_min
                )
            } else {
                format!(
                    "'{}' needs at least {} min but only {} min remain unallocated",
                    c.title, c.min_session_min, budget
                )
            };
            blockers.push((
                idx,
                Blocker::new(
                    c.work_item_id.as_str(),
                    BlockerCode::SessionMinExceedsAvailable,
                    message,
                ),
            ));
        }
        blockers.sort_by_key(|(idx, _)| *idx);

        let mut slots: Vec<(usize, i64)> = allocated.into_iter().collect();
        slots.sort_by_key(|(idx, _)| *idx);
        let slices: Vec<WorkSlice> = slots
            .into_iter()
            .map(|(idx, minutes)| {
                let sc = &sorted[idx];
                WorkSlice {
                    work_item_id: sc.candidate.work_item_id.clone(),
                    project_id: sc.candidate.project_id.clone(),
                    title: sc.candidate.title.clone(),
                    project_name: sc.candidate.project_name.clone(),
                    allocated_min: minutes,
                    score: sc.score,
                    reasons: sc.reasons.clone(),
                }
            })
            .collect();

        let total_allocated_min = slices.iter().map(|s| s.allocated_min).sum();
        Allocation {
            slices,
            blockers: blockers.into_iter().map(|(_, b)| b).collect(),
            total_allocated_min,
            unallocated_min: self.available_min - total_allocated_min,
        }
    }
}
