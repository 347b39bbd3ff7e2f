//! Error types for the project crate (thiserror-based).

use rk_common::EngineError;
use rk_timeline_eval::TimelineEvalError;
use thiserror::Error;

/// Errors that can occur during project file operations.
#[derive(Error, Debug)]
pub enum ProjectError {
    /// File I/O error (read, write, path resolution).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Project was written by a newer format.
    #[error("Unsupported project version: {version}")]
    UnsupportedVersion { version: String },

    /// Project file is structurally unusable.
    #[error("Invalid project file: {reason}")]
    InvalidProject { reason: String },

    /// Timeline failed validation after normalization.
    #[error("Invalid timeline: {0}")]
    Timeline(#[from] TimelineEvalError),

    #[error("Migration failed from version {from} to {to}: {reason}")]
    MigrationFailed {
        from: String,
        to: String,
        reason: String,
    },

    #[error("Project file not found: {path}")]
    NotFound { path: String },

    /// The background saver thread has exited.
    #[error("Background saver is not running")]
    SaverStopped,
}

/// Convenience Result type for project operations.
pub type ProjectResult<T> = Result<T, ProjectError>;

impl From<ProjectError> for EngineError {
    fn from(err: ProjectError) -> Self {
        match err {
            ProjectError::Io(io) => EngineError::Io(io),
            other => EngineError::Persistence(other.to_string()),
        }
    }
}
