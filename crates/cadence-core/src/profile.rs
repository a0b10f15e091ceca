//! User tuning profile: scoring weights, baseline pace and deadline buffer.
//!
//! A profile is an explicit value handed to every pipeline call, never global
//! state, so one process can evaluate several profiles side by side.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Weights for each scoring factor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    /// Weight for deadline pressure (higher = chase approaching deadlines)
    #[serde(default = "default_deadline")]
    pub deadline: f64,
    /// Weight for project risk elevation
    #[serde(default = "default_risk")]
    pub risk: f64,
    /// Weight for anti-cram spacing
    #[serde(default = "default_spacing")]
    pub spacing: f64,
    /// Weight for cross-project variation
    #[serde(default = "default_variation")]
    pub variation: f64,
    /// Weight for progress lag inside a project
    #[serde(default = "default_progress")]
    pub progress: f64,
    /// Weight for session fit against available time
    #[serde(default = "default_session_fit")]
    pub session_fit: f64,
}

fn default_deadline() -> f64 {
    0.30
}
fn default_risk() -> f64 {
    0.20
}
fn default_spacing() -> f64 {
    0.15
}
fn default_variation() -> f64 {
    0.10
}
fn default_progress() -> f64 {
    0.15
}
fn default_session_fit() -> f64 {
    0.10
}

impl ScoringWeights {
    /// Default balanced weights
    pub fn balanced() -> Self {
        Self {
            deadline: default_deadline(),
            risk: default_risk(),
            spacing: default_spacing(),
            variation: default_variation(),
            progress: default_progress(),
            session_fit: default_session_fit(),
        }
    }

    /// Chase whatever is due soonest
    pub fn deadline_focused() -> Self {
        Self {
            deadline: 0.45,
            risk: 0.25,
            spacing: 0.05,
            variation: 0.05,
            progress: 0.10,
            session_fit: 0.10,
        }
    }

    /// Spread effort evenly over time and projects
    pub fn steady_pace() -> Self {
        Self {
            deadline: 0.15,
            risk: 0.15,
            spacing: 0.25,
            variation: 0.20,
            progress: 0.15,
            session_fit: 0.10,
        }
    }

    /// Look up a preset by name.
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "balanced" => Some(Self::balanced()),
            "deadline_focused" => Some(Self::deadline_focused()),
            "steady_pace" => Some(Self::steady_pace()),
            _ => None,
        }
    }

    fn as_array(&self) -> [(&'static str, f64); 6] {
        [
            ("deadline", self.deadline),
            ("risk", self.risk),
            ("spacing", self.spacing),
            ("variation", self.variation),
            ("progress", self.progress),
            ("session_fit", self.session_fit),
        ]
    }

    /// Normalize weights to sum to 1.0
    pub fn normalize(&mut self) {
        let sum: f64 = self.as_array().iter().map(|(_, w)| w).sum();
        if sum > 0.0 {
            self.deadline /= sum;
            self.risk /= sum;
            self.spacing /= sum;
            self.variation /= sum;
            self.progress /= sum;
            self.session_fit /= sum;
        }
    }

    /// Validate that all weights are finite and in [0.0, 1.0]
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (name, weight) in self.as_array() {
            if !weight.is_finite() || !(0.0..=1.0).contains(&weight) {
                return Err(ValidationError::InvalidValue {
                    field: format!("weights.{name}"),
                    message: format!("must be in [0.0, 1.0], got {weight}"),
                });
            }
        }
        Ok(())
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self::balanced()
    }
}

/// Per-user tuning handed to the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub weights: ScoringWeights,
    /// Minutes per day the user commits to regardless of recent history
    #[serde(default = "default_baseline_daily_min")]
    pub baseline_daily_min: i64,
    /// Safety margin on required pace, as a fraction (0.15 = 15%)
    #[serde(default = "default_buffer_pct")]
    pub buffer_pct: f64,
}

fn default_baseline_daily_min() -> i64 {
    60
}
fn default_buffer_pct() -> f64 {
    0.15
}

/// Upper bound on the deadline buffer fraction.
const MAX_BUFFER_PCT: f64 = 5.0;

impl UserProfile {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.weights.validate()?;
        if self.baseline_daily_min < 0 {
            return Err(ValidationError::InvalidValue {
                field: "baseline_daily_min".into(),
                message: format!("must be non-negative, got {}", self.baseline_daily_min),
            });
        }
        if !self.buffer_pct.is_finite() || !(0.0..=MAX_BUFFER_PCT).contains(&self.buffer_pct) {
            return Err(ValidationError::InvalidValue {
                field: "buffer_pct".into(),
                message: format!("must be in [0.0, {MAX_BUFFER_PCT}], got {}", self.buffer_pct),
            });
        }
        Ok(())
    }
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            baseline_daily_min: default_baseline_daily_min(),
            buffer_pct: default_buffer_pct(),
        }
    }
}
