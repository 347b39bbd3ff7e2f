//! Collaborator traits.
//!
//! The engine never touches pixels, codecs or storage directly. Hosts plug
//! those in through these traits; the editor and player program against the
//! traits, not against concrete backends.

use crate::error::{EngineResult, RecordingError, RenderError};
use crate::render::RenderParams;
use crate::types::{FrameNumber, RecordingRef, Resolution};

/// Metadata for one recording segment.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RecordingInfo {
    /// Available source material, seconds.
    pub duration: f64,
    pub resolution: Resolution,
}

/// Source of recording metadata, used to clamp clip-segment edits.
pub trait RecordingProvider: Send + Sync {
    /// Metadata for the given recording segment.
    fn info(&self, recording: RecordingRef) -> Result<RecordingInfo, RecordingError>;

    /// Available source duration in seconds.
    fn duration(&self, recording: RecordingRef) -> Result<f64, RecordingError> {
        self.info(recording).map(|info| info.duration)
    }

    fn dimensions(&self, recording: RecordingRef) -> Result<Resolution, RecordingError> {
        self.info(recording).map(|info| info.resolution)
    }
}

/// Fixed list of recordings known up front (one entry per segment).
#[derive(Clone, Debug, Default)]
pub struct StaticRecordings {
    entries: Vec<RecordingInfo>,
}

impl StaticRecordings {
    pub fn new(entries: Vec<RecordingInfo>) -> Self {
        Self { entries }
    }

    /// A single recording of the given length at 1080p.
    pub fn single(duration: f64) -> Self {
        Self::new(vec![RecordingInfo {
            duration,
            resolution: Resolution::HD,
        }])
    }
}

impl RecordingProvider for StaticRecordings {
    fn info(&self, recording: RecordingRef) -> Result<RecordingInfo, RecordingError> {
        self.entries
            .get(recording.0)
            .copied()
            .ok_or(RecordingError::UnknownSegment(recording.0))
    }
}

/// Transport command forwarded to the renderer, keyed by frame position.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TransportCommand {
    Play(FrameNumber),
    Pause(FrameNumber),
    Seek(FrameNumber),
}

/// Consumer of composed frames.
pub trait Renderer: Send + Sync {
    /// Draw or encode one composed frame.
    fn submit(&self, frame: &RenderParams) -> Result<(), RenderError>;

    /// Transport notification. Renderers that ignore transport may keep the default.
    fn transport(&self, _command: TransportCommand) -> Result<(), RenderError> {
        Ok(())
    }
}

/// External storage for serialized projects.
pub trait ProjectStore: Send + Sync {
    /// Persist a serialized project snapshot, replacing the previous one.
    fn save(&self, serialized: &str) -> EngineResult<()>;

    /// The most recently saved snapshot, if any.
    fn load(&self) -> EngineResult<Option<String>>;
}
