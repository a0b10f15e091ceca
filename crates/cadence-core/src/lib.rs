//! # Cadence Core Library
//!
//! This library decides how a single person should spend the time they have
//! right now across several long-running projects. The CLI is a thin layer
//! over the same library.
//!
//! ## Architecture
//!
//! - **Risk**: classifies each project as on track, at risk or critical from
//!   remaining work, deadline distance and recent pace
//! - **Scoring**: weighs six explainable factors per work item
//! - **Allocation**: splits the available minutes in canonical order, with a
//!   variation pass so several projects move forward
//! - **Re-estimation**: smooths planned minutes toward the pace implied by
//!   completed units
//! - **Snapshot**: the only data seam; read once per run
//!
//! ## Key Components
//!
//! - [`Engine`]: recommend, status and replan
//! - [`PlanningContext`]: inputs captured from a [`SnapshotSource`]
//! - [`Snapshot`]: in-memory source persisted as JSON
//! - [`Config`]: profile and command-line defaults

pub mod aggregate;
pub mod allocator;
pub mod config;
pub mod error;
pub mod model;
pub mod ordering;
pub mod pipeline;
pub mod profile;
pub mod reestimate;
pub mod risk;
pub mod scoring;
pub mod source;

pub use aggregate::ProjectAggregate;
pub use allocator::{Allocation, Allocator, Blocker, BlockerCode, Mode, WorkSlice};
pub use config::Config;
pub use error::{ConfigError, CoreError, Result, ValidationError};
pub use model::{Candidate, DurationMode, Project, SessionRecord, WorkItem, WorkItemStatus};
pub use pipeline::{
    Engine, PlanningContext, ProjectDelta, ProjectStatus, Recommendation, ReplanReport,
    StatusReport,
};
pub use profile::{ScoringWeights, UserProfile};
pub use reestimate::{PlannedChange, ReEstimator};
pub use risk::{RiskClassifier, RiskLevel, RiskResult};
pub use scoring::{Reason, ScoredCandidate, Scorer};
pub use source::{Snapshot, SnapshotSource};
