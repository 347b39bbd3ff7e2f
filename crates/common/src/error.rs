//! Central error types for the engine (thiserror-based).
//!
//! Editing operations never fail: they clamp or become no-ops. Errors only
//! arise at the collaborator boundary (rendering, recordings, persistence).

use thiserror::Error;

/// Top-level engine error, surfaced to the host application.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Recording error: {0}")]
    Recording(#[from] RecordingError),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Errors reported by a renderer collaborator.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Renderer is not ready")]
    NotReady,

    #[error("Frame submission failed at {time:.3}s: {reason}")]
    SubmitFailed { time: f64, reason: String },

    #[error("Renderer disconnected")]
    Disconnected,
}

/// Errors reported by a recording provider.
#[derive(Error, Debug, PartialEq)]
pub enum RecordingError {
    #[error("Unknown recording segment {0}")]
    UnknownSegment(usize),

    #[error("Recording metadata unavailable: {0}")]
    Unavailable(String),
}

/// Convenience Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_errors_convert_and_display() {
        let err: EngineError = RecordingError::UnknownSegment(3).into();
        assert_eq!(
            err.to_string(),
            "Recording error: Unknown recording segment 3"
        );

        let err: EngineError = RenderError::SubmitFailed {
            time: 1.5,
            reason: "lost device".into(),
        }
        .into();
        assert!(err.to_string().contains("1.500s"));
    }
}
