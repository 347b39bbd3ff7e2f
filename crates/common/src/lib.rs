//! `rk-common` -- Shared types, traits, and errors for the ReelKit timeline engine.
//!
//! This crate is the foundation that all other engine crates depend on.
//! It defines the core abstractions:
//!
//! - **Types**: `TimeCode`, `FrameNumber`, `Rational`, `Resolution`, `XY`, `Color`
//! - **Render**: `RenderParams` and its parts (the composed frame handed to a renderer)
//! - **Providers**: `RecordingProvider`, `Renderer`, `ProjectStore` (collaborator seams)
//! - **Errors**: `EngineError`, `RenderError`, `RecordingError` (thiserror-based)
//! - **Config**: `EditorConfig`, `KeyframeEditPolicy`

pub mod config;
pub mod error;
pub mod provider;
pub mod render;
pub mod types;

// Re-export commonly used items at crate root
pub use config::{DefaultDurations, EditorConfig, KeyframeEditPolicy, ViewportLimits};
pub use error::{EngineError, EngineResult, RecordingError, RenderError};
pub use provider::{
    ProjectStore, RecordingInfo, RecordingProvider, Renderer, StaticRecordings,
    TransportCommand,
};
pub use render::{
    AspectRatio, BackgroundConfig, BackgroundSource, BaseVideo, CaptionFrame, CaptionPosition,
    CaptionStyle, Crop, FontStyle, KeyOverlay, MaskMode, MaskRect, PerspectivePose,
    RenderParams, SceneMode, SceneState, TextBox, ZoomTransform,
};
pub use types::{
    Color, FrameNumber, Rational, RecordingRef, Resolution, TimeCode, TIME_EPSILON, XY,
};
