//! `rk-timeline-eval` -- Timeline model and frame composition for the
//! ReelKit timeline engine.
//!
//! This crate owns the project data model and turns it into per-frame
//! [`RenderParams`](rk_common::RenderParams). It handles:
//!
//! - **Time mapping**: timeline time to source time across cuts and speed changes
//! - **Keyframe interpolation**: linear and hold, clamped at the boundaries
//! - **Fades and ramps**: overlay fade envelopes, zoom and perspective ramps
//! - **Validation**: structural checks and repair of loaded timelines
//!
//! # Usage
//!
//! ```rust
//! use rk_common::RecordingRef;
//! use rk_timeline_eval::{compose_frame, OverlaySegment, Project, ZoomParams};
//!
//! let mut project = Project::from_recording(RecordingRef(0), 60.0);
//! project
//!     .timeline
//!     .zoom
//!     .push(OverlaySegment::new(5.0, 10.0, ZoomParams::default()));
//! let frame = compose_frame(&project, 7.5);
//! assert!(frame.zoom.amount > 1.0);
//! ```

pub mod easing;
pub mod error;
pub mod evaluator;
pub mod keyboard;
pub mod keyframe;
pub mod scene;
pub mod time_map;
pub mod track_eval;
pub mod transition;
pub mod types;
pub mod validate;

// Re-export primary API
pub use easing::CubicBezier;
pub use error::TimelineEvalError;
pub use evaluator::{compose_frame, compose_frame_with, ComposeSettings};
pub use keyboard::{is_modifier_key, key_label, visible_keys};
pub use keyframe::{
    evaluate_keyframes, normalize_keyframes, split_keyframes, upsert_keyframe, Interpolation,
    Keyframe, Lerp,
};
pub use scene::{evaluate_scene, MIN_TRANSITION_GAP, SCENE_TRANSITION};
pub use time_map::{SourcePosition, SourceWindow, TimeMap};
pub use track_eval::{active_index, evaluate_caption, evaluate_track, Evaluate};
pub use transition::{
    adjacency, compute_progress, fade_envelope, fade_windows, segment_fade, Adjacency,
};
pub use types::{
    BlurParams, BlurSegment, CaptionParams, CaptionSegment, CaptionStyleOverride, ClipSegment,
    KeyPressEvent, MaskKeyframes, MaskKind, MaskParams, MaskSegment, OverlaySegment,
    PerspectiveParams, PerspectiveSegment, Preset, Project, SceneParams, SceneSegment,
    TextParams, TextSegment, Timeline,
    TrackKind, TrackParams, ZoomKeyframes, ZoomMode, ZoomParams, ZoomSegment,
};
pub use validate::{normalize_project, normalize_timeline, validate_timeline};
