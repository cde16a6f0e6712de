//! Error types for SiteInspect

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SiteError {
    // Geometry errors
    #[error("Invalid geometry: {reason}")]
    InvalidGeometry { reason: String },

    #[error("At least 3 points are required to close a polygon, found {count}")]
    InsufficientPoints { count: usize },

    // Snapshot errors
    #[error("Failed to parse snapshot: {reason}")]
    SnapshotParse { reason: String },

    #[error("Snapshot contains no usable coordinates")]
    NoCoordinates,

    // Workflow errors
    #[error("No site boundary. Draw or load a boundary first")]
    NoBoundary,

    #[error("Front and back edges must be selected first")]
    EdgesNotSelected,

    #[error("Buildable area computation returned no usable polygon")]
    EmptyResult,

    // Network errors
    #[error("{operation} timed out after {seconds}s")]
    Timeout { operation: String, seconds: u64 },

    #[error("Transport error during {operation}: {reason}")]
    Transport { operation: String, reason: String },

    // Configuration errors
    #[error("Missing required configuration: {key}")]
    ConfigMissing { key: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SiteError {
    pub fn invalid_geometry(reason: impl Into<String>) -> Self {
        Self::InvalidGeometry { reason: reason.into() }
    }

    pub fn transport(operation: impl Into<String>, reason: impl ToString) -> Self {
        Self::Transport { operation: operation.into(), reason: reason.to_string() }
    }

    /// Whether the error came from the network layer rather than local validation.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Transport { .. })
    }
}

impl From<serde_json::Error> for SiteError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SiteError>;
