//! The data seam between the engine and whatever stores projects.
//!
//! The engine never performs I/O during a run. A [`SnapshotSource`] is asked
//! for everything once, when a planning context is captured. [`Snapshot`] is
//! the in-memory implementation, persisted as a JSON document.

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{CoreError, Result};
use crate::model::{Candidate, Project, SessionRecord, WorkItem};
use crate::profile::UserProfile;
use crate::reestimate::PlannedChange;

/// Every storage backend implements this trait.
pub trait SnapshotSource {
    /// All projects, archived ones included.
    fn list_projects(&self) -> Result<Vec<Project>>;

    /// All work items, whatever their status.
    fn list_work_items(&self) -> Result<Vec<WorkItem>>;

    /// Sessions that started in `[from, to)`.
    fn sessions_between(&self, from: DateTime<Utc>, to: DateTime<Utc>)
        -> Result<Vec<SessionRecord>>;

    /// The user's tuning profile.
    fn profile(&self) -> Result<UserProfile>;

    /// Schedulable work items joined with their project context.
    ///
    /// Reads projects, items and sessions again; a planning run joins the
    /// data it already captured with [`build_candidates`] instead.
    fn list_candidates(&self) -> Result<Vec<Candidate>> {
        let projects = self.list_projects()?;
        let items = self.list_work_items()?;
        let sessions = self.sessions_between(DateTime::<Utc>::MIN_UTC, DateTime::<Utc>::MAX_UTC)?;
        Ok(build_candidates(&projects, &items, &sessions))
    }
}

/// Join schedulable items with project names, dependency state and recency.
pub fn build_candidates(
    projects: &[Project],
    items: &[WorkItem],
    sessions: &[SessionRecord],
) -> Vec<Candidate> {
    let projects_by_id: HashMap<&str, &Project> =
        projects.iter().map(|p| (p.id.as_str(), p)).collect();
    let status_by_id: HashMap<&str, _> = items.iter().map(|i| (i.id.as_str(), i.status)).collect();

    let mut item_last: HashMap<&str, DateTime<Utc>> = HashMap::new();
    let mut project_last: HashMap<&str, DateTime<Utc>> = HashMap::new();
    for s in sessions {
        let Some(end) = s.ended_at() else {
            warn!(
                work_item = %s.work_item_id,
                minutes = s.minutes,
                "skipping session with unrepresentable end"
            );
            continue;
        };
        item_last
            .entry(s.work_item_id.as_str())
            .and_modify(|t| *t = (*t).max(end))
            .or_insert(end);
        project_last
            .entry(s.project_id.as_str())
            .and_modify(|t| *t = (*t).max(end))
            .or_insert(end);
    }

    let mut candidates = Vec::new();
    for item in items.iter().filter(|i| i.status.is_schedulable()) {
        let Some(project) = projects_by_id.get(item.project_id.as_str()) else {
            warn!(work_item = %item.id, project = %item.project_id, "work item references unknown project");
            continue;
        };
        if project.archived {
            continue;
        }
        let dependencies_met = item.depends_on.iter().all(|dep| {
            status_by_id
                .get(dep.as_str())
                .map_or(true, |status| status.satisfies_dependency())
        });

        candidates.push(Candidate {
            work_item_id: item.id.clone(),
            node_id: item.node_id.clone(),
            project_id: item.project_id.clone(),
            title: item.title.clone(),
            project_name: project.name.clone(),
            project_target_date: project.target_date,
            planned_min: item.planned_min,
            logged_min: item.logged_min,
            min_session_min: item.min_session_min,
            max_session_min: item.max_session_min,
            preferred_session_min: item.preferred_session_min,
            not_before: item.not_before,
            due_date: item.effective_due_date(),
            units_total: item.units_total,
            units_done: item.units_done,
            duration_mode: item.duration_mode,
            dependencies_met,
            last_worked_at: item_last.get(item.id.as_str()).copied(),
            project_last_worked_at: project_last.get(item.project_id.as_str()).copied(),
        });
    }
    debug!(candidates = candidates.len(), "built candidates");
    candidates
}

/// Everything the engine needs, held in memory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Overrides the configured profile when present
    #[serde(default)]
    pub profile: Option<UserProfile>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub work_items: Vec<WorkItem>,
    #[serde(default)]
    pub sessions: Vec<SessionRecord>,
}

impl Snapshot {
    /// Read a snapshot document from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid snapshot.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CoreError::Snapshot {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&content).map_err(|e| CoreError::Snapshot {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Persist atomically: the previous file stays intact if anything fails.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be serialized or written.
    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let content = serde_json::to_string_pretty(self)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.persist(path).map_err(|e| CoreError::Io(e.error))?;
        Ok(())
    }

    /// Use `profile` unless the snapshot carries its own.
    pub fn with_fallback_profile(mut self, profile: UserProfile) -> Self {
        self.profile.get_or_insert(profile);
        self
    }

    /// Write re-estimated planned minutes back into the items.
    ///
    /// Returns the number of items updated.
    pub fn apply_changes(&mut self, changes: &[PlannedChange]) -> usize {
        let by_id: HashMap<&str, i64> = changes
            .iter()
            .map(|c| (c.work_item_id.as_str(), c.new_planned_min))
            .collect();
        let mut updated = 0;
        for item in &mut self.work_items {
            if let Some(&planned) = by_id.get(item.id.as_str()) {
                item.planned_min = planned;
                updated += 1;
            }
        }
        updated
    }
}

impl SnapshotSource for Snapshot {
    fn list_projects(&self) -> Result<Vec<Project>> {
        Ok(self.projects.clone())
    }

    fn list_work_items(&self) -> Result<Vec<WorkItem>> {
        Ok(self.work_items.clone())
    }

    fn sessions_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<SessionRecord>> {
        Ok(self
            .sessions
            .iter()
            .filter(|s| s.started_at >= from && s.started_at < to)
            .cloned()
            .collect())
    }

    fn profile(&self) -> Result<UserProfile> {
        Ok(self.profile.unwrap_or_default())
    }

    fn list_candidates(&self) -> Result<Vec<Candidate>> {
        Ok(build_candidates(&self.projects, &self.work_items, &self.sessions))
    }
}
