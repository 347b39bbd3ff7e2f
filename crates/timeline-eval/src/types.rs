//! Timeline data model: clip segments, overlay tracks, and the project that
//! owns them.
//!
//! Clip segments live on the *source* axis and are laid end to end to form
//! the timeline axis. Overlay segments live directly on the *timeline* axis.

use std::fmt;

use serde::{Deserialize, Serialize};

use rk_common::{
    AspectRatio, BackgroundConfig, CaptionPosition, CaptionStyle, Color, Crop, EditorConfig,
    FontStyle, RecordingRef, SceneMode, XY,
};

use crate::keyframe::{normalize_keyframes, split_keyframes, Keyframe};

// ---------------------------------------------------------------------------
// Tracks
// ---------------------------------------------------------------------------

/// Identifies one category of segment.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TrackKind {
    Clip,
    Zoom,
    Mask,
    Text,
    Blur,
    Perspective,
    Caption,
    Scene,
}

impl TrackKind {
    pub const ALL: [TrackKind; 8] = [
        TrackKind::Clip,
        TrackKind::Zoom,
        TrackKind::Mask,
        TrackKind::Text,
        TrackKind::Blur,
        TrackKind::Perspective,
        TrackKind::Caption,
        TrackKind::Scene,
    ];

    /// Tracks whose segments are positioned on the timeline axis directly.
    pub const OVERLAYS: [TrackKind; 7] = [
        TrackKind::Zoom,
        TrackKind::Mask,
        TrackKind::Text,
        TrackKind::Blur,
        TrackKind::Perspective,
        TrackKind::Caption,
        TrackKind::Scene,
    ];

    /// Deleting from a gapless track closes the hole.
    pub fn is_gapless(self) -> bool {
        matches!(self, TrackKind::Clip)
    }

    pub fn label(self) -> &'static str {
        match self {
            TrackKind::Clip => "clip",
            TrackKind::Zoom => "zoom",
            TrackKind::Mask => "mask",
            TrackKind::Text => "text",
            TrackKind::Blur => "blur",
            TrackKind::Perspective => "perspective",
            TrackKind::Caption => "caption",
            TrackKind::Scene => "scene",
        }
    }
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Segments
// ---------------------------------------------------------------------------

/// A contiguous slice of a recording played at `timescale` speed.
///
/// `start`/`end` are source times. The segment's position on the timeline is
/// implied by the durations of the clips before it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipSegment {
    pub start: f64,
    pub end: f64,
    #[serde(default = "default_timescale")]
    pub timescale: f64,
    #[serde(default)]
    pub recording: RecordingRef,
}

fn default_timescale() -> f64 {
    1.0
}

impl ClipSegment {
    pub fn new(start: f64, end: f64) -> Self {
        Self {
            start,
            end,
            timescale: 1.0,
            recording: RecordingRef(0),
        }
    }

    pub fn with_timescale(mut self, timescale: f64) -> Self {
        self.timescale = timescale;
        self
    }

    pub fn with_recording(mut self, recording: RecordingRef) -> Self {
        self.recording = recording;
        self
    }

    /// Length on the timeline axis.
    pub fn duration(&self) -> f64 {
        (self.end - self.start) / self.timescale
    }

    /// Length on the source axis.
    pub fn source_duration(&self) -> f64 {
        self.end - self.start
    }
}

/// A time-bounded overlay on the timeline axis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlaySegment<P> {
    pub start: f64,
    pub end: f64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub params: P,
}

fn default_enabled() -> bool {
    true
}

impl<P> OverlaySegment<P> {
    pub fn new(start: f64, end: f64, params: P) -> Self {
        Self {
            start,
            end,
            enabled: true,
            params,
        }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Half-open containment: `start <= time < end`.
    pub fn contains(&self, time: f64) -> bool {
        time >= self.start && time < self.end
    }

    pub fn is_active_at(&self, time: f64) -> bool {
        self.enabled && self.contains(time)
    }
}

pub type ZoomSegment = OverlaySegment<ZoomParams>;
pub type MaskSegment = OverlaySegment<MaskParams>;
pub type TextSegment = OverlaySegment<TextParams>;
pub type BlurSegment = OverlaySegment<BlurParams>;
pub type PerspectiveSegment = OverlaySegment<PerspectiveParams>;
pub type CaptionSegment = OverlaySegment<CaptionParams>;
pub type SceneSegment = OverlaySegment<SceneParams>;

// ---------------------------------------------------------------------------
// Track parameters
// ---------------------------------------------------------------------------

/// Per-track parameter payload, giving generic editing code access to the
/// track storage and track-specific behaviour.
pub trait TrackParams: Clone + fmt::Debug + PartialEq + Send + Sync + 'static {
    const KIND: TrackKind;

    fn track(timeline: &Timeline) -> &Vec<OverlaySegment<Self>>;

    fn track_mut(timeline: &mut Timeline) -> &mut Vec<OverlaySegment<Self>>;

    /// Parameters for a freshly inserted segment.
    fn with_defaults(config: &EditorConfig) -> Self;

    /// Length of a freshly inserted segment.
    fn default_duration(config: &EditorConfig) -> f64;

    /// Parameters for the two halves when split at local offset `at`.
    fn split(&self, _at: f64) -> (Self, Self) {
        (self.clone(), self.clone())
    }

    fn has_keyframes(&self) -> bool {
        false
    }

    /// Drop animation, keeping the current static values.
    fn clear_keyframes(&mut self) {}

    /// Sort keyframes and drop those outside a segment of `duration`.
    fn normalize(&mut self, _duration: f64) {}
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ZoomMode {
    /// Follow the cursor when the host supplies one.
    #[default]
    Auto,
    /// Fixed focus point.
    Manual,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ZoomKeyframes {
    pub amount: Vec<Keyframe<f64>>,
    pub center: Vec<Keyframe<XY<f64>>>,
}

impl ZoomKeyframes {
    pub fn is_empty(&self) -> bool {
        self.amount.is_empty() && self.center.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoomParams {
    /// Magnification, `1.0` is none.
    pub amount: f64,
    #[serde(default)]
    pub mode: ZoomMode,
    /// Focus point for manual mode and the auto-mode fallback.
    #[serde(default = "center")]
    pub center: XY<f64>,
    #[serde(default)]
    pub keyframes: ZoomKeyframes,
}

fn center() -> XY<f64> {
    XY::CENTER
}

impl Default for ZoomParams {
    fn default() -> Self {
        Self {
            amount: 1.5,
            mode: ZoomMode::Auto,
            center: XY::CENTER,
            keyframes: ZoomKeyframes::default(),
        }
    }
}

impl TrackParams for ZoomParams {
    const KIND: TrackKind = TrackKind::Zoom;

    fn track(timeline: &Timeline) -> &Vec<OverlaySegment<Self>> {
        &timeline.zoom
    }

    fn track_mut(timeline: &mut Timeline) -> &mut Vec<OverlaySegment<Self>> {
        &mut timeline.zoom
    }

    fn with_defaults(_config: &EditorConfig) -> Self {
        Self::default()
    }

    fn default_duration(config: &EditorConfig) -> f64 {
        config.default_durations.zoom
    }

    fn split(&self, at: f64) -> (Self, Self) {
        let (amount_l, amount_r) = split_keyframes(&self.keyframes.amount, at, self.amount);
        let (center_l, center_r) = split_keyframes(&self.keyframes.center, at, self.center);
        let mut left = self.clone();
        let mut right = self.clone();
        left.keyframes = ZoomKeyframes {
            amount: amount_l,
            center: center_l,
        };
        right.keyframes = ZoomKeyframes {
            amount: amount_r,
            center: center_r,
        };
        (left, right)
    }

    fn has_keyframes(&self) -> bool {
        !self.keyframes.is_empty()
    }

    fn clear_keyframes(&mut self) {
        self.keyframes = ZoomKeyframes::default();
    }

    fn normalize(&mut self, duration: f64) {
        normalize_keyframes(&mut self.keyframes.amount, duration);
        normalize_keyframes(&mut self.keyframes.center, duration);
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MaskKind {
    /// Pixelate the region.
    #[default]
    Sensitive,
    /// Darken everything except the region.
    Highlight,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MaskKeyframes {
    pub position: Vec<Keyframe<XY<f64>>>,
    pub size: Vec<Keyframe<XY<f64>>>,
    pub intensity: Vec<Keyframe<f64>>,
}

impl MaskKeyframes {
    pub fn is_empty(&self) -> bool {
        self.position.is_empty() && self.size.is_empty() && self.intensity.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MaskParams {
    pub kind: MaskKind,
    pub center: XY<f64>,
    pub size: XY<f64>,
    /// Edge softness, fraction of the smaller half-axis.
    pub feather: f64,
    /// Base intensity, `0..1`.
    pub opacity: f64,
    /// Pixel block size for [`MaskKind::Sensitive`].
    pub pixelation: f64,
    /// Darkening outside the region for [`MaskKind::Highlight`].
    pub darkness: f64,
    pub fade_duration: f64,
    pub keyframes: MaskKeyframes,
}

impl Default for MaskParams {
    fn default() -> Self {
        Self {
            kind: MaskKind::Sensitive,
            center: XY::CENTER,
            size: XY::new(0.35, 0.35),
            feather: 0.1,
            opacity: 1.0,
            pixelation: 18.0,
            darkness: 0.5,
            fade_duration: 0.15,
            keyframes: MaskKeyframes::default(),
        }
    }
}

impl TrackParams for MaskParams {
    const KIND: TrackKind = TrackKind::Mask;

    fn track(timeline: &Timeline) -> &Vec<OverlaySegment<Self>> {
        &timeline.masks
    }

    fn track_mut(timeline: &mut Timeline) -> &mut Vec<OverlaySegment<Self>> {
        &mut timeline.masks
    }

    fn with_defaults(config: &EditorConfig) -> Self {
        Self {
            fade_duration: config.mask_fade_duration,
            ..Self::default()
        }
    }

    fn default_duration(config: &EditorConfig) -> f64 {
        config.default_durations.mask
    }

    fn split(&self, at: f64) -> (Self, Self) {
        let k = &self.keyframes;
        let (pos_l, pos_r) = split_keyframes(&k.position, at, self.center);
        let (size_l, size_r) = split_keyframes(&k.size, at, self.size);
        let (int_l, int_r) = split_keyframes(&k.intensity, at, self.opacity);
        let mut left = self.clone();
        let mut right = self.clone();
        left.keyframes = MaskKeyframes {
            position: pos_l,
            size: size_l,
            intensity: int_l,
        };
        right.keyframes = MaskKeyframes {
            position: pos_r,
            size: size_r,
            intensity: int_r,
        };
        (left, right)
    }

    fn has_keyframes(&self) -> bool {
        !self.keyframes.is_empty()
    }

    fn clear_keyframes(&mut self) {
        self.keyframes = MaskKeyframes::default();
    }

    fn normalize(&mut self, duration: f64) {
        normalize_keyframes(&mut self.keyframes.position, duration);
        normalize_keyframes(&mut self.keyframes.size, duration);
        normalize_keyframes(&mut self.keyframes.intensity, duration);
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextParams {
    pub content: String,
    pub center: XY<f64>,
    pub size: XY<f64>,
    pub font: FontStyle,
    pub fade_duration: f64,
    /// Animated center, local segment time.
    pub position_keyframes: Vec<Keyframe<XY<f64>>>,
}

impl Default for TextParams {
    fn default() -> Self {
        Self {
            content: "Text".to_string(),
            center: XY::CENTER,
            size: XY::new(0.35, 0.2),
            font: FontStyle::default(),
            fade_duration: 0.15,
            position_keyframes: Vec::new(),
        }
    }
}

impl TrackParams for TextParams {
    const KIND: TrackKind = TrackKind::Text;

    fn track(timeline: &Timeline) -> &Vec<OverlaySegment<Self>> {
        &timeline.texts
    }

    fn track_mut(timeline: &mut Timeline) -> &mut Vec<OverlaySegment<Self>> {
        &mut timeline.texts
    }

    fn with_defaults(config: &EditorConfig) -> Self {
        Self {
            fade_duration: config.text_fade_duration,
            ..Self::default()
        }
    }

    fn default_duration(config: &EditorConfig) -> f64 {
        config.default_durations.text
    }

    fn split(&self, at: f64) -> (Self, Self) {
        let (left_keys, right_keys) = split_keyframes(&self.position_keyframes, at, self.center);
        let mut left = self.clone();
        let mut right = self.clone();
        left.position_keyframes = left_keys;
        right.position_keyframes = right_keys;
        (left, right)
    }

    fn has_keyframes(&self) -> bool {
        !self.position_keyframes.is_empty()
    }

    fn clear_keyframes(&mut self) {
        self.position_keyframes.clear();
    }

    fn normalize(&mut self, duration: f64) {
        normalize_keyframes(&mut self.position_keyframes, duration);
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlurParams {
    pub center: XY<f64>,
    pub size: XY<f64>,
    /// Blur radius in output pixels.
    pub amount: f64,
    pub feather: f64,
    pub fade_duration: f64,
}

impl Default for BlurParams {
    fn default() -> Self {
        Self {
            center: XY::CENTER,
            size: XY::new(0.3, 0.3),
            amount: 12.0,
            feather: 0.1,
            fade_duration: 0.15,
        }
    }
}

impl TrackParams for BlurParams {
    const KIND: TrackKind = TrackKind::Blur;

    fn track(timeline: &Timeline) -> &Vec<OverlaySegment<Self>> {
        &timeline.blurs
    }

    fn track_mut(timeline: &mut Timeline) -> &mut Vec<OverlaySegment<Self>> {
        &mut timeline.blurs
    }

    fn with_defaults(config: &EditorConfig) -> Self {
        Self {
            fade_duration: config.blur_fade_duration,
            ..Self::default()
        }
    }

    fn default_duration(config: &EditorConfig) -> f64 {
        config.default_durations.blur
    }
}

/// 3D pose of the recording plane, degrees.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PerspectiveParams {
    pub rotation_x: f64,
    pub rotation_y: f64,
    pub depth: f64,
    /// Ramp in/out duration; `None` uses the editor default.
    pub ramp: Option<f64>,
}

impl Default for PerspectiveParams {
    fn default() -> Self {
        Self {
            rotation_x: 10.0,
            rotation_y: -15.0,
            depth: 0.2,
            ramp: None,
        }
    }
}

impl TrackParams for PerspectiveParams {
    const KIND: TrackKind = TrackKind::Perspective;

    fn track(timeline: &Timeline) -> &Vec<OverlaySegment<Self>> {
        &timeline.perspectives
    }

    fn track_mut(timeline: &mut Timeline) -> &mut Vec<OverlaySegment<Self>> {
        &mut timeline.perspectives
    }

    fn with_defaults(_config: &EditorConfig) -> Self {
        Self::default()
    }

    fn default_duration(config: &EditorConfig) -> f64 {
        config.default_durations.perspective
    }
}

/// Caption style with every field optional; unset fields fall back to the
/// track defaults and then to [`CaptionStyle::default`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CaptionStyleOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<CaptionPosition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outline: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outline_color: Option<Color>,
}

impl CaptionStyleOverride {
    /// Resolve `self` over `track`, then over the built-in default.
    pub fn resolve(&self, track: &CaptionStyleOverride) -> CaptionStyle {
        let base = CaptionStyle::default();
        CaptionStyle {
            font: self
                .font
                .clone()
                .or_else(|| track.font.clone())
                .unwrap_or(base.font),
            size: self.size.or(track.size).unwrap_or(base.size),
            color: self.color.or(track.color).unwrap_or(base.color),
            background: self.background.or(track.background).unwrap_or(base.background),
            position: self.position.or(track.position).unwrap_or(base.position),
            outline: self.outline.or(track.outline).unwrap_or(base.outline),
            outline_color: self
                .outline_color
                .or(track.outline_color)
                .unwrap_or(base.outline_color),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CaptionParams {
    pub text: String,
    pub style: CaptionStyleOverride,
}

impl TrackParams for CaptionParams {
    const KIND: TrackKind = TrackKind::Caption;

    fn track(timeline: &Timeline) -> &Vec<OverlaySegment<Self>> {
        &timeline.captions
    }

    fn track_mut(timeline: &mut Timeline) -> &mut Vec<OverlaySegment<Self>> {
        &mut timeline.captions
    }

    fn with_defaults(_config: &EditorConfig) -> Self {
        Self::default()
    }

    fn default_duration(config: &EditorConfig) -> f64 {
        config.default_durations.caption
    }
}

/// Switches the layout between screen and camera for a stretch of time.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SceneParams {
    pub mode: SceneMode,
}

impl TrackParams for SceneParams {
    const KIND: TrackKind = TrackKind::Scene;

    fn track(timeline: &Timeline) -> &Vec<OverlaySegment<Self>> {
        &timeline.scenes
    }

    fn track_mut(timeline: &mut Timeline) -> &mut Vec<OverlaySegment<Self>> {
        &mut timeline.scenes
    }

    fn with_defaults(_config: &EditorConfig) -> Self {
        Self {
            mode: SceneMode::CameraOnly,
        }
    }

    fn default_duration(config: &EditorConfig) -> f64 {
        config.default_durations.scene
    }
}

// ---------------------------------------------------------------------------
// Timeline & project
// ---------------------------------------------------------------------------

/// All tracks of a project. Each overlay track is sorted by `start` and
/// non-overlapping; the clip track is gapless by construction.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeline {
    pub clips: Vec<ClipSegment>,
    #[serde(default)]
    pub zoom: Vec<ZoomSegment>,
    #[serde(default)]
    pub masks: Vec<MaskSegment>,
    #[serde(default)]
    pub texts: Vec<TextSegment>,
    #[serde(default)]
    pub blurs: Vec<BlurSegment>,
    #[serde(default)]
    pub perspectives: Vec<PerspectiveSegment>,
    #[serde(default)]
    pub captions: Vec<CaptionSegment>,
    #[serde(default)]
    pub scenes: Vec<SceneSegment>,
    /// Track-level caption style, between segment overrides and built-in defaults.
    #[serde(default)]
    pub caption_defaults: CaptionStyleOverride,
}

impl Timeline {
    /// A timeline with one clip covering `[0, duration]` of `recording`.
    pub fn from_recording(recording: RecordingRef, duration: f64) -> Self {
        Self {
            clips: vec![ClipSegment::new(0.0, duration.max(0.0)).with_recording(recording)],
            ..Self::default()
        }
    }

    /// Sum of clip durations on the timeline axis.
    pub fn total_duration(&self) -> f64 {
        self.clips.iter().map(ClipSegment::duration).sum()
    }

    pub fn track_len(&self, kind: TrackKind) -> usize {
        match kind {
            TrackKind::Clip => self.clips.len(),
            TrackKind::Zoom => self.zoom.len(),
            TrackKind::Mask => self.masks.len(),
            TrackKind::Text => self.texts.len(),
            TrackKind::Blur => self.blurs.len(),
            TrackKind::Perspective => self.perspectives.len(),
            TrackKind::Caption => self.captions.len(),
            TrackKind::Scene => self.scenes.len(),
        }
    }

    /// `(start, end)` of an overlay segment on the timeline axis. For clips,
    /// the timeline interval the clip occupies.
    pub fn segment_bounds(&self, kind: TrackKind, index: usize) -> Option<(f64, f64)> {
        fn bounds<P>(track: &[OverlaySegment<P>], index: usize) -> Option<(f64, f64)> {
            track.get(index).map(|s| (s.start, s.end))
        }
        match kind {
            TrackKind::Clip => {
                let clip = self.clips.get(index)?;
                let start: f64 = self.clips[..index].iter().map(ClipSegment::duration).sum();
                Some((start, start + clip.duration()))
            }
            TrackKind::Zoom => bounds(&self.zoom, index),
            TrackKind::Mask => bounds(&self.masks, index),
            TrackKind::Text => bounds(&self.texts, index),
            TrackKind::Blur => bounds(&self.blurs, index),
            TrackKind::Perspective => bounds(&self.perspectives, index),
            TrackKind::Caption => bounds(&self.captions, index),
            TrackKind::Scene => bounds(&self.scenes, index),
        }
    }
}

/// A key press captured during recording, on the source axis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyPressEvent {
    pub key: String,
    /// Source time in seconds.
    pub time: f64,
    #[serde(default = "default_enabled")]
    pub down: bool,
    /// Modifier keys held at the time of the press.
    #[serde(default)]
    pub modifiers: Vec<String>,
}

/// Named look that can be applied to a project.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    pub name: String,
    #[serde(default)]
    pub aspect_ratio: Option<AspectRatio>,
    #[serde(default)]
    pub background: BackgroundConfig,
}

/// Everything the editor owns for one recording.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub timeline: Timeline,
    #[serde(default)]
    pub aspect_ratio: Option<AspectRatio>,
    #[serde(default)]
    pub background: BackgroundConfig,
    #[serde(default)]
    pub crop: Option<Crop>,
    #[serde(default)]
    pub presets: Vec<Preset>,
    /// Sorted by source time.
    #[serde(default)]
    pub keyboard: Vec<KeyPressEvent>,
}

impl Project {
    /// The default project for a fresh recording: one clip, no overlays.
    pub fn from_recording(recording: RecordingRef, duration: f64) -> Self {
        Self {
            timeline: Timeline::from_recording(recording, duration),
            ..Self::default()
        }
    }

    pub fn total_duration(&self) -> f64 {
        self.timeline.total_duration()
    }

    /// Apply a preset's look. Returns `false` if no preset has that name.
    pub fn apply_preset(&mut self, name: &str) -> bool {
        let Some(preset) = self.presets.iter().find(|p| p.name == name) else {
            return false;
        };
        self.aspect_ratio = preset.aspect_ratio;
        self.background = preset.background.clone();
        true
    }

    /// Add or replace a preset capturing the current look.
    pub fn save_preset(&mut self, name: impl Into<String>) {
        let name = name.into();
        let preset = Preset {
            name: name.clone(),
            aspect_ratio: self.aspect_ratio,
            background: self.background.clone(),
        };
        match self.presets.iter_mut().find(|p| p.name == name) {
            Some(existing) => *existing = preset,
            None => self.presets.push(preset),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rk_common::BackgroundSource;

    #[test]
    fn clip_duration_respects_timescale() {
        let clip = ClipSegment::new(2.0, 8.0).with_timescale(2.0);
        assert!((clip.duration() - 3.0).abs() < 1e-12);
        assert!((clip.source_duration() - 6.0).abs() < 1e-12);
    }

    #[test]
    fn overlay_containment_is_half_open() {
        let seg = OverlaySegment::new(1.0, 2.0, ZoomParams::default());
        assert!(seg.contains(1.0));
        assert!(seg.contains(1.999));
        assert!(!seg.contains(2.0));
        assert!(!seg.contains(0.999));
    }

    #[test]
    fn disabled_segment_is_never_active() {
        let mut seg = OverlaySegment::new(0.0, 5.0, BlurParams::default());
        seg.enabled = false;
        assert!(!seg.is_active_at(1.0));
    }

    #[test]
    fn project_from_recording_has_single_clip() {
        let project = Project::from_recording(RecordingRef(0), 12.5);
        assert_eq!(project.timeline.clips.len(), 1);
        assert_eq!(project.total_duration(), 12.5);
        assert!(project.timeline.zoom.is_empty());
    }

    #[test]
    fn clip_bounds_are_cumulative() {
        let mut timeline = Timeline::default();
        timeline.clips = vec![
            ClipSegment::new(0.0, 5.0),
            ClipSegment::new(10.0, 16.0).with_timescale(2.0),
        ];
        assert_eq!(timeline.segment_bounds(TrackKind::Clip, 1), Some((5.0, 8.0)));
        assert_eq!(timeline.segment_bounds(TrackKind::Clip, 2), None);
    }

    #[test]
    fn caption_style_fallback_chain() {
        let segment = CaptionStyleOverride {
            size: Some(40.0),
            ..Default::default()
        };
        let track = CaptionStyleOverride {
            size: Some(30.0),
            position: Some(CaptionPosition::Top),
            ..Default::default()
        };
        let style = segment.resolve(&track);
        assert_eq!(style.size, 40.0);
        assert_eq!(style.position, CaptionPosition::Top);
        assert_eq!(style.color, Color::WHITE);

        let bare = CaptionStyleOverride::default().resolve(&CaptionStyleOverride::default());
        assert_eq!(bare, CaptionStyle::default());
    }

    #[test]
    fn mask_split_rebases_keyframes() {
        let mut params = MaskParams::default();
        params.keyframes.intensity = vec![Keyframe::linear(0.0, 0.0), Keyframe::linear(4.0, 1.0)];
        let (left, right) = params.split(2.0);

        let l = &left.keyframes.intensity;
        assert_eq!(l.len(), 2);
        assert!((l[1].time - 2.0).abs() < 1e-12);
        assert!((l[1].value - 0.5).abs() < 1e-12);

        let r = &right.keyframes.intensity;
        assert_eq!(r.len(), 2);
        assert_eq!(r[0].time, 0.0);
        assert!((r[0].value - 0.5).abs() < 1e-12);
        assert!((r[1].time - 2.0).abs() < 1e-12);
    }

    #[test]
    fn presets_apply_and_replace() {
        let mut project = Project::from_recording(RecordingRef(0), 10.0);
        project.aspect_ratio = Some(AspectRatio::Square);
        project.save_preset("square");
        project.aspect_ratio = None;
        project.background.source = BackgroundSource::Wallpaper { id: 3 };
        project.save_preset("square");
        assert_eq!(project.presets.len(), 1);

        project.background = BackgroundConfig::default();
        assert!(project.apply_preset("square"));
        assert_eq!(
            project.background.source,
            BackgroundSource::Wallpaper { id: 3 }
        );
        assert!(!project.apply_preset("missing"));
    }

    #[test]
    fn timeline_json_defaults_missing_tracks() {
        let json = r#"{ "clips": [ { "start": 0.0, "end": 4.0 } ] }"#;
        let timeline: Timeline = serde_json::from_str(json).unwrap();
        assert_eq!(timeline.clips[0].timescale, 1.0);
        assert!(timeline.captions.is_empty());
        assert_eq!(timeline.total_duration(), 4.0);
    }
}
