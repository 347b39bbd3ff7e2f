//! Error types for the editor session (thiserror-based).
//!
//! Editing itself never fails; operations clamp or return `None`. These
//! errors come from opening a session and from collaborators.

use rk_common::EngineError;
use rk_project::ProjectError;
use rk_timeline_eval::TimelineEvalError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    /// The project could not be repaired into a valid timeline.
    #[error("Invalid timeline: {0}")]
    Timeline(#[from] TimelineEvalError),

    #[error("Project error: {0}")]
    Project(#[from] ProjectError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The store has no saved project to open.
    #[error("No saved project in store")]
    NothingSaved,

    #[error("Player thread failed to start: {0}")]
    PlayerSpawn(#[source] std::io::Error),
}

/// Convenience Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

impl From<SessionError> for EngineError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Engine(inner) => inner,
            SessionError::Project(inner) => inner.into(),
            SessionError::PlayerSpawn(io) => EngineError::Io(io),
            other => EngineError::Other(other.to_string()),
        }
    }
}
