//! Core error types for cadence-core.
//!
//! Every failure the engine can report is a value of [`CoreError`], so callers
//! branch on the variant instead of matching message text. "No eligible work"
//! is an expected outcome and carries the blockers that explain it.

use std::path::PathBuf;
use thiserror::Error;

use crate::allocator::Blocker;

/// Core error type for cadence-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Input rejected before any pipeline stage ran
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Every candidate was blocked and no minutes were allocated
    #[error("No eligible work: {} candidate(s) blocked", blockers.len())]
    NoEligibleWork { blockers: Vec<Blocker> },

    /// Replan was asked for but the snapshot holds no active project
    #[error("No active projects to replan")]
    NoActiveProjects,

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Snapshot file errors
    #[error("Snapshot error for {path}: {message}")]
    Snapshot { path: PathBuf, message: String },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    /// True for outcomes a front-end should render as a message, not a failure.
    pub fn is_informational(&self) -> bool {
        matches!(self, CoreError::NoEligibleWork { .. })
    }
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Data directory could not be located or created
    #[error("Failed to access data directory: {0}")]
    DataDir(String),
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Negative available minutes on a request
    #[error("Available minutes must be non-negative, got {0}")]
    NegativeAvailable(i64),

    /// Session bounds out of order on a work item
    #[error("Work item '{id}': min_session_min ({min}) exceeds max_session_min ({max})")]
    SessionBounds { id: String, min: i64, max: i64 },

    /// A minute quantity that must be non-negative was negative
    #[error("Work item '{id}': {field} must be non-negative, got {value}")]
    NegativeMinutes {
        id: String,
        field: &'static str,
        value: i64,
    },

    /// A logged session whose length is negative or implausibly long
    #[error("Session on work item '{work_item_id}': length {minutes} min is outside 0..={max}")]
    SessionLength {
        work_item_id: String,
        minutes: i64,
        max: i64,
    },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
