//! Error types for Fault Forest

use thiserror::Error;

/// Errors that can occur anywhere in the maintenance pipeline
#[derive(Debug, Error)]
pub enum MaintenanceError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("Distribution error: {0}")]
    Distribution(String),

    #[error("Model is not fitted: {0}")]
    NotFitted(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MaintenanceError {
    /// Creates an invalid argument error.
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument(reason.into())
    }

    /// Creates a shape mismatch error.
    pub fn shape_mismatch(reason: impl Into<String>) -> Self {
        Self::ShapeMismatch(reason.into())
    }

    /// Creates an empty input error.
    pub fn empty_input(reason: impl Into<String>) -> Self {
        Self::EmptyInput(reason.into())
    }

    /// Creates a configuration error.
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config(reason.into())
    }
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, MaintenanceError>;
