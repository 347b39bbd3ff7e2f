//! Composed frame description: the interface between the frame composer
//! and an external renderer.
//!
//! A [`RenderParams`] is the fully resolved visual state at one instant of
//! the timeline. Overlay positions and sizes are normalized to the output
//! frame (`0..1`, origin top-left).

use serde::{Deserialize, Serialize};

use crate::types::{Color, FrameNumber, RecordingRef, XY};

// ---------------------------------------------------------------------------
// Project-level look
// ---------------------------------------------------------------------------

/// Output aspect ratio. `None` on the project means "follow the recording".
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AspectRatio {
    #[default]
    Wide,
    Vertical,
    Square,
    Classic,
    Tall,
}

impl AspectRatio {
    /// Width divided by height.
    pub fn ratio(self) -> f64 {
        match self {
            Self::Wide => 16.0 / 9.0,
            Self::Vertical => 9.0 / 16.0,
            Self::Square => 1.0,
            Self::Classic => 4.0 / 3.0,
            Self::Tall => 3.0 / 4.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum BackgroundSource {
    Wallpaper {
        id: u16,
    },
    Image {
        path: Option<String>,
    },
    Color {
        value: Color,
    },
    Gradient {
        from: Color,
        to: Color,
        #[serde(default = "default_gradient_angle")]
        angle: u16,
    },
}

fn default_gradient_angle() -> u16 {
    90
}

impl Default for BackgroundSource {
    fn default() -> Self {
        Self::Color {
            value: Color::rgba(71.0 / 255.0, 133.0 / 255.0, 1.0, 1.0),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BackgroundConfig {
    pub source: BackgroundSource,
    pub blur: u32,
    /// Padding around the recording, percent of the output.
    pub padding: f32,
    /// Corner rounding of the recording, percent.
    pub rounding: f32,
}

/// Crop rectangle in recording pixels.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Crop {
    pub position: XY<u32>,
    pub size: XY<u32>,
}

impl Crop {
    pub fn aspect_ratio(&self) -> f64 {
        if self.size.y == 0 {
            return 1.0;
        }
        self.size.x as f64 / self.size.y as f64
    }
}

// ---------------------------------------------------------------------------
// Text styling
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FontStyle {
    pub family: String,
    /// Point size at 1080p output height.
    pub size: f32,
    /// CSS-style weight, 100..900.
    pub weight: u16,
    pub italic: bool,
    pub color: Color,
}

impl Default for FontStyle {
    fn default() -> Self {
        Self {
            family: "sans-serif".to_string(),
            size: 48.0,
            weight: 700,
            italic: false,
            color: Color::WHITE,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CaptionPosition {
    Top,
    Middle,
    #[default]
    Bottom,
}

/// Fully resolved caption style.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionStyle {
    pub font: String,
    pub size: f32,
    pub color: Color,
    pub background: Color,
    pub position: CaptionPosition,
    pub outline: bool,
    pub outline_color: Color,
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self {
            font: "sans-serif".to_string(),
            size: 24.0,
            color: Color::WHITE,
            background: Color::BLACK.with_alpha(0.8),
            position: CaptionPosition::Bottom,
            outline: true,
            outline_color: Color::BLACK,
        }
    }
}

// ---------------------------------------------------------------------------
// Per-frame resolved state
// ---------------------------------------------------------------------------

/// The recording slice shown at this instant.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseVideo {
    /// Index of the clip segment on the timeline.
    pub segment_index: usize,
    pub recording: RecordingRef,
    /// Position in the recording, seconds.
    pub source_time: f64,
    /// `source_time` snapped to the nearest frame at the playback rate.
    pub frame: FrameNumber,
}

/// Zoom applied to the recording. `amount == 1.0` is identity.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoomTransform {
    pub amount: f64,
    pub center: XY<f64>,
}

impl ZoomTransform {
    pub const IDENTITY: Self = Self {
        amount: 1.0,
        center: XY::CENTER,
    };

    pub fn is_identity(&self) -> bool {
        (self.amount - 1.0).abs() < 1e-9
    }
}

impl Default for ZoomTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MaskMode {
    /// Obscure the region (pixelate/blur).
    Sensitive,
    /// Darken everything outside the region.
    Highlight,
    /// Gaussian blur inside the region.
    Blur,
}

/// One active mask or blur region.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaskRect {
    pub mode: MaskMode,
    pub center: XY<f64>,
    pub size: XY<f64>,
    pub feather: f64,
    /// Fade envelope, `0..1`.
    pub opacity: f64,
    /// Effect strength with the fade applied, `0..1`.
    pub intensity: f64,
    pub pixelation: f64,
    pub darkness: f64,
    /// Blur radius in pixels for [`MaskMode::Blur`].
    pub blur_amount: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextBox {
    pub content: String,
    pub center: XY<f64>,
    pub size: XY<f64>,
    pub font: FontStyle,
    pub opacity: f64,
}

/// 3D rotation of the recording plane, degrees.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerspectivePose {
    pub rotation_x: f64,
    pub rotation_y: f64,
    pub depth: f64,
}

impl PerspectivePose {
    pub const IDENTITY: Self = Self {
        rotation_x: 0.0,
        rotation_y: 0.0,
        depth: 0.0,
    };

    pub fn is_identity(&self) -> bool {
        self.rotation_x == 0.0 && self.rotation_y == 0.0 && self.depth == 0.0
    }
}

impl Default for PerspectivePose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Which sources a scene shows.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SceneMode {
    /// Screen with the camera bubble.
    #[default]
    Default,
    /// Camera fills the frame.
    CameraOnly,
    /// Screen only.
    HideCamera,
}

impl SceneMode {
    fn camera_opacity(self) -> f64 {
        match self {
            SceneMode::Default | SceneMode::CameraOnly => 1.0,
            SceneMode::HideCamera => 0.0,
        }
    }
}

/// Scene layout at one instant, possibly part way between two modes.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneState {
    pub from: SceneMode,
    pub to: SceneMode,
    /// Eased progress from `from` to `to`, `0..=1`.
    pub progress: f64,
    pub camera_opacity: f64,
    /// Blur over the screen while the camera takes over the frame.
    pub screen_blur: f64,
    /// Scale of the full-frame camera, `1.1` when it starts or ends.
    pub camera_only_zoom: f64,
    pub camera_only_blur: f64,
}

impl SceneState {
    pub const DEFAULT: Self = Self::settled(SceneMode::Default);

    pub const fn settled(mode: SceneMode) -> Self {
        Self {
            from: mode,
            to: mode,
            progress: 1.0,
            camera_opacity: match mode {
                SceneMode::HideCamera => 0.0,
                _ => 1.0,
            },
            screen_blur: 0.0,
            camera_only_zoom: 1.0,
            camera_only_blur: 0.0,
        }
    }

    /// The state `progress` of the way from `from` to `to`.
    pub fn between(from: SceneMode, to: SceneMode, progress: f64) -> Self {
        let p = progress.clamp(0.0, 1.0);
        let lerp = |a: f64, b: f64| a + (b - a) * p;
        let (entering, leaving) = (
            to == SceneMode::CameraOnly && from != SceneMode::CameraOnly,
            from == SceneMode::CameraOnly && to != SceneMode::CameraOnly,
        );
        Self {
            from,
            to,
            progress: p,
            camera_opacity: lerp(from.camera_opacity(), to.camera_opacity()),
            screen_blur: if entering {
                p
            } else if leaving {
                1.0 - p
            } else {
                0.0
            },
            camera_only_zoom: if entering {
                lerp(1.1, 1.0)
            } else if leaving {
                lerp(1.0, 1.1)
            } else {
                1.0
            },
            camera_only_blur: if entering {
                1.0 - p
            } else if leaving {
                p
            } else {
                0.0
            },
        }
    }

    /// The mode that dominates the frame.
    pub fn mode(&self) -> SceneMode {
        if self.progress > 0.5 {
            self.to
        } else {
            self.from
        }
    }

    pub fn is_transitioning(&self) -> bool {
        self.from != self.to && self.progress < 1.0
    }

    /// Opacity of the full-frame camera layer.
    pub fn camera_only_opacity(&self) -> f64 {
        match (self.from == SceneMode::CameraOnly, self.to == SceneMode::CameraOnly) {
            (true, true) => 1.0,
            (true, false) => 1.0 - self.progress,
            (false, true) => self.progress,
            (false, false) => 0.0,
        }
    }

    /// Opacity of the camera bubble. It fades out faster than the
    /// full-frame camera fades in, so the two never show at once.
    pub fn bubble_opacity(&self) -> f64 {
        match (self.from == SceneMode::CameraOnly, self.to == SceneMode::CameraOnly) {
            (true, true) => 0.0,
            (false, true) => (1.0 - self.progress * 1.5).max(0.0) * self.camera_opacity,
            (true, false) => (self.progress * 1.5).min(1.0) * self.camera_opacity,
            (false, false) => self.camera_opacity,
        }
    }
}

impl Default for SceneState {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionFrame {
    pub text: String,
    pub style: CaptionStyle,
    pub opacity: f64,
}

/// A key press shown in the keyboard overlay.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyOverlay {
    pub label: String,
    /// Seconds since the press was first shown.
    pub age: f64,
    pub opacity: f64,
}

/// Everything a renderer needs to draw one frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderParams {
    /// Timeline time this frame was composed for (after clamping).
    pub time: f64,
    /// `None` only when the timeline has no clip segments.
    pub base: Option<BaseVideo>,
    pub zoom: ZoomTransform,
    pub masks: Vec<MaskRect>,
    pub texts: Vec<TextBox>,
    pub perspective: PerspectivePose,
    pub scene: SceneState,
    pub caption: Option<CaptionFrame>,
    pub keys: Vec<KeyOverlay>,
    pub crop: Option<Crop>,
    pub background: BackgroundConfig,
    pub aspect_ratio: Option<AspectRatio>,
}

impl RenderParams {
    /// A frame with no overlays at `time`.
    pub fn empty(time: f64) -> Self {
        Self {
            time,
            base: None,
            zoom: ZoomTransform::IDENTITY,
            masks: Vec::new(),
            texts: Vec::new(),
            perspective: PerspectivePose::IDENTITY,
            scene: SceneState::DEFAULT,
            caption: None,
            keys: Vec::new(),
            crop: None,
            background: BackgroundConfig::default(),
            aspect_ratio: None,
        }
    }
}
