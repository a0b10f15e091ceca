//! Recommend, status and replan.
//!
//! Each operation runs the same stages over a [`PlanningContext`] captured
//! once from a [`SnapshotSource`]:
//!
//! ```text
//! aggregate → classify risk → mode → score → canonical sort → allocate → respond
//! ```
//!
//! Replan instead re-estimates unit-tracked items and classifies risk twice,
//! before and after, from two independent aggregate snapshots.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::aggregate::{aggregate_projects, trailing_daily_pace, ProjectAggregate, PACE_WINDOW_DAYS};
use crate::allocator::{Allocator, Blocker, Mode, WorkSlice};
use crate::error::{CoreError, Result, ValidationError};
use crate::model::{Candidate, Project, SessionRecord, WorkItem};
use crate::ordering::sort_canonical;
use crate::profile::UserProfile;
use crate::reestimate::{PlannedChange, ReEstimator};
use crate::risk::{RiskClassifier, RiskInput, RiskLevel, RiskResult};
use crate::scoring::{ScoredCandidate, Scorer, ScoringContext};
use crate::source::{build_candidates, SnapshotSource};

/// Inputs for one run, read once and never refreshed mid-computation.
#[derive(Debug, Clone)]
pub struct PlanningContext {
    pub now: DateTime<Utc>,
    pub projects: Vec<Project>,
    pub work_items: Vec<WorkItem>,
    pub candidates: Vec<Candidate>,
    /// Sessions inside the trailing pace window
    pub recent_sessions: Vec<SessionRecord>,
    pub profile: UserProfile,
}

impl PlanningContext {
    /// Read everything a run needs from `source`, once.
    ///
    /// Candidates are joined from the projects, items and sessions read here,
    /// so they always agree with `work_items`.
    ///
    /// # Errors
    ///
    /// Propagates any error the source reports, and rejects sessions whose
    /// length is out of range with [`CoreError::Validation`].
    pub fn capture<S: SnapshotSource + ?Sized>(source: &S, now: DateTime<Utc>) -> Result<Self> {
        let projects = source.list_projects()?;
        let work_items = source.list_work_items()?;
        let sessions = source.sessions_between(DateTime::<Utc>::MIN_UTC, now)?;
        for session in &sessions {
            session.validate()?;
        }
        let profile = source.profile()?;

        let candidates = build_candidates(&projects, &work_items, &sessions);
        let window_start = now - Duration::days(PACE_WINDOW_DAYS);
        let recent_sessions = sessions
            .into_iter()
            .filter(|s| s.started_at >= window_start)
            .collect();

        let ctx = Self {
            now,
            projects,
            work_items,
            candidates,
            recent_sessions,
            profile,
        };
        debug!(
            projects = ctx.projects.len(),
            work_items = ctx.work_items.len(),
            candidates = ctx.candidates.len(),
            sessions = ctx.recent_sessions.len(),
            "captured planning context"
        );
        Ok(ctx)
    }

    pub fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }

    fn active_projects(&self) -> impl Iterator<Item = &Project> {
        self.projects.iter().filter(|p| !p.archived)
    }

    /// Reject malformed inputs before any stage runs.
    fn validate(&self) -> Result<()> {
        self.profile.validate()?;
        for item in &self.work_items {
            item.validate()?;
        }
        for candidate in &self.candidates {
            candidate.validate()?;
        }
        for session in &self.recent_sessions {
            session.validate()?;
        }
        Ok(())
    }
}

/// Rollup and risk for one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectStatus {
    pub aggregate: ProjectAggregate,
    pub risk: RiskResult,
}

/// Answer to "what should I work on now".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub generated_at: DateTime<Utc>,
    pub mode: Mode,
    pub available_min: i64,
    pub slices: Vec<WorkSlice>,
    pub blockers: Vec<Blocker>,
    pub risks: Vec<ProjectStatus>,
    pub total_allocated_min: i64,
    pub unallocated_min: i64,
}

/// Read-only snapshot of every active project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub generated_at: DateTime<Utc>,
    pub mode: Mode,
    pub projects: Vec<ProjectStatus>,
}

/// Risk before and after re-estimation for one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectDelta {
    pub project_id: String,
    pub project_name: String,
    pub before: RiskResult,
    pub after: RiskResult,
    pub changed_items_count: usize,
}

impl ProjectDelta {
    pub fn level_changed(&self) -> bool {
        self.before.level != self.after.level
    }
}

/// Outcome of a replan run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplanReport {
    pub generated_at: DateTime<Utc>,
    pub projects: Vec<ProjectDelta>,
    pub changes: Vec<PlannedChange>,
}

impl ReplanReport {
    pub fn changed_items_count(&self) -> usize {
        self.changes.len()
    }

    /// Changes grouped per project, one persistence transaction each.
    pub fn changes_by_project(&self) -> BTreeMap<&str, Vec<&PlannedChange>> {
        let mut grouped: BTreeMap<&str, Vec<&PlannedChange>> = BTreeMap::new();
        for change in &self.changes {
            grouped.entry(change.project_id.as_str()).or_default().push(change);
        }
        grouped
    }
}

/// The decision engine. Stateless; every input arrives through the context.
pub struct Engine;

impl Engine {
    /// Allocate `available_min` minutes across the candidates.
    ///
    /// # Errors
    ///
    /// - [`CoreError::Validation`] for malformed inputs, before any stage runs
    /// - [`CoreError::NoEligibleWork`] when nothing could be allocated
    pub fn recommend(ctx: &PlanningContext, available_min: i64) -> Result<Recommendation> {
        if available_min < 0 {
            return Err(ValidationError::NegativeAvailable(available_min).into());
        }
        ctx.validate()?;

        let statuses = assess(ctx, &ctx.work_items);
        let mode = Mode::from_levels(statuses.iter().map(|s| s.risk.level));
        debug!(%mode, projects = statuses.len(), "classified projects");

        let by_project: HashMap<&str, &ProjectStatus> = statuses
            .iter()
            .map(|s| (s.aggregate.project_id.as_str(), s))
            .collect();
        let fallback = RiskResult {
            level: RiskLevel::OnTrack,
            required_daily_min: 0.0,
            remaining_min: 0,
            days_remaining: None,
        };

        let mut scored: Vec<ScoredCandidate> = ctx
            .candidates
            .iter()
            .map(|candidate| {
                let status = by_project.get(candidate.project_id.as_str());
                Scorer::score(&ScoringContext {
                    candidate,
                    risk: status.map_or(&fallback, |s| &s.risk),
                    project_progress_pct: status.map_or(0.0, |s| s.aggregate.progress_pct),
                    available_min,
                    now: ctx.now,
                    weights: ctx.profile.weights,
                })
            })
            .collect();
        sort_canonical(&mut scored);

        let allocation = Allocator::new(available_min, mode, ctx.today()).allocate(&scored);
        if allocation.slices.is_empty() {
            info!(blockers = allocation.blockers.len(), "no eligible work");
            return Err(CoreError::NoEligibleWork {
                blockers: allocation.blockers,
            });
        }

        info!(
            %mode,
            slices = allocation.slices.len(),
            allocated = allocation.total_allocated_min,
            blockers = allocation.blockers.len(),
            "recommendation ready"
        );
        Ok(Recommendation {
            generated_at: ctx.now,
            mode,
            available_min,
            slices: allocation.slices,
            blockers: allocation.blockers,
            risks: statuses,
            total_allocated_min: allocation.total_allocated_min,
            unallocated_min: allocation.unallocated_min,
        })
    }

    /// Aggregates and risk for every active project, without allocating.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] for malformed inputs.
    pub fn status(ctx: &PlanningContext) -> Result<StatusReport> {
        ctx.validate()?;
        let projects = assess(ctx, &ctx.work_items);
        let mode = Mode::from_levels(projects.iter().map(|s| s.risk.level));
        info!(%mode, projects = projects.len(), "status ready");
        Ok(StatusReport {
            generated_at: ctx.now,
            mode,
            projects,
        })
    }

    /// Re-estimate unit-tracked items and report the risk shift per project.
    ///
    /// # Errors
    ///
    /// - [`CoreError::Validation`] for malformed inputs, before any stage runs
    /// - [`CoreError::NoActiveProjects`] when there is nothing to replan
    pub fn replan(ctx: &PlanningContext) -> Result<ReplanReport> {
        ctx.validate()?;
        if ctx.active_projects().next().is_none() {
            return Err(CoreError::NoActiveProjects);
        }

        let before = assess(ctx, &ctx.work_items);

        let mut items: Vec<WorkItem> = ctx.work_items.clone();
        let active: HashSet<&str> = ctx.active_projects().map(|p| p.id.as_str()).collect();
        let changes = ReEstimator::apply_all(
            items
                .iter_mut()
                .filter(|i| active.contains(i.project_id.as_str())),
        );

        let after = assess(ctx, &items);
        let after_by_project: HashMap<&str, &RiskResult> = after
            .iter()
            .map(|s| (s.aggregate.project_id.as_str(), &s.risk))
            .collect();

        let projects: Vec<ProjectDelta> = before
            .iter()
            .filter_map(|b| {
                let project_id = b.aggregate.project_id.as_str();
                let after = after_by_project.get(project_id)?;
                Some(ProjectDelta {
                    project_id: project_id.to_string(),
                    project_name: b.aggregate.project_name.clone(),
                    before: b.risk.clone(),
                    after: (*after).clone(),
                    changed_items_count: changes.iter().filter(|c| c.project_id == project_id).count(),
                })
            })
            .collect();

        info!(
            projects = projects.len(),
            changed = changes.len(),
            "replan ready"
        );
        Ok(ReplanReport {
            generated_at: ctx.now,
            projects,
            changes,
        })
    }
}

/// Aggregate and classify every active project against `items`.
fn assess(ctx: &PlanningContext, items: &[WorkItem]) -> Vec<ProjectStatus> {
    let pace = trailing_daily_pace(&ctx.recent_sessions, ctx.now);
    aggregate_projects(&ctx.projects, items, ctx.today())
        .into_iter()
        .map(|aggregate| {
            let trailing = pace.get(&aggregate.project_id).copied().unwrap_or(0.0);
            let input = RiskInput::from_aggregate(&aggregate, ctx.now, &ctx.profile, trailing);
            let risk = RiskClassifier::classify(&input);
            ProjectStatus { aggregate, risk }
        })
        .collect()
}
