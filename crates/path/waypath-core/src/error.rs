//! Error types for path building and driver control operations.

use crate::config::MovementMode;

/// Errors surfaced by configuration loading and control operations.
///
/// The per-tick update never fails; numeric degeneracies are floored or snapped instead.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum PathError {
    /// Two-point path without a start or end waypoint
    #[error("Two-point path requires a {which} waypoint")]
    MissingEndpoint { which: &'static str },

    /// Multi-point path with fewer than two waypoints
    #[error("Multi-point path requires at least 2 waypoints, got {count}")]
    TooFewWaypoints { count: usize },

    /// Anchor point source selected without an attached anchor
    #[error("Anchor point source selected but no anchor is attached")]
    AnchorUnavailable,

    /// Operation called in the wrong movement mode
    #[error("{operation} requires {expected:?} mode (current: {actual:?})")]
    InvalidMode {
        operation: &'static str,
        expected: MovementMode,
        actual: MovementMode,
    },

    /// Operation rejected while a climb segment is running
    #[error("{operation} rejected: a climb segment is still active")]
    SegmentActive { operation: &'static str },

    /// No path has been built yet
    #[error("No path has been built")]
    NoPath,

    /// Configuration values out of range
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// JSON parse failure
    #[error("Parse error: {reason}")]
    Parse { reason: String },
}

impl PathError {
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::MissingEndpoint { .. }
            | Self::TooFewWaypoints { .. }
            | Self::AnchorUnavailable
            | Self::NoPath => "path",
            Self::InvalidMode { .. } | Self::SegmentActive { .. } => "control",
            Self::InvalidConfig { .. } | Self::Parse { .. } => "config",
        }
    }
}

impl From<serde_json::Error> for PathError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse {
            reason: err.to_string(),
        }
    }
}
