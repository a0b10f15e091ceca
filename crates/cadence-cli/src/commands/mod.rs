pub mod completions;
pub mod config;
pub mod recommend;
pub mod replan;
pub mod status;

use std::path::PathBuf;

use cadence_core::{Config, PlanningContext, RiskResult, Snapshot};
use chrono::{DateTime, Utc};
use clap::Args;

/// Options shared by every command that reads a snapshot.
#[derive(Args, Debug, Clone)]
pub struct SnapshotArgs {
    /// Snapshot file (defaults to `defaults.snapshot_path` from the config)
    #[arg(long, short)]
    pub snapshot: Option<PathBuf>,
    /// Evaluate as of this instant (RFC 3339) instead of now
    #[arg(long)]
    pub at: Option<DateTime<Utc>>,
    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

/// A snapshot read from disk, where it came from, and the context built on it.
pub struct Loaded {
    pub path: PathBuf,
    pub snapshot: Snapshot,
    pub ctx: PlanningContext,
    pub config: Config,
}

impl SnapshotArgs {
    pub fn load(&self) -> Result<Loaded, Box<dyn std::error::Error>> {
        let config = Config::load_or_default();
        let path = match (&self.snapshot, &config.defaults.snapshot_path) {
            (Some(p), _) => p.clone(),
            (None, Some(p)) => PathBuf::from(p),
            (None, None) => {
                return Err("no snapshot given: pass --snapshot or set defaults.snapshot_path".into())
            }
        };
        let snapshot = Snapshot::load(&path)?;
        let now = self.at.unwrap_or_else(Utc::now);
        // the stored file keeps its own profile, if any, when saved back
        let source = snapshot.clone().with_fallback_profile(config.profile);
        let ctx = PlanningContext::capture(&source, now)?;
        Ok(Loaded {
            path,
            snapshot,
            ctx,
            config,
        })
    }
}

pub fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// One-line risk summary, e.g. `at_risk  142 min left, 48.3 min/day over 3.0 days`.
pub fn describe_risk(risk: &RiskResult) -> String {
    match risk.days_remaining {
        Some(days) => format!(
            "{:<9} {} min left, {:.1} min/day over {:.1} days",
            risk.level.as_str(),
            risk.remaining_min,
            risk.required_daily_min,
            days
        ),
        None => format!("{:<9} {} min left, no target date", risk.level.as_str(), risk.remaining_min),
    }
}
