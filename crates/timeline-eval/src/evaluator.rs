//! Frame composition: `compose_frame()` takes a project and a timeline time
//! and produces the [`RenderParams`] for that instant.
//!
//! The evaluation process:
//! 1. Clamp the time into `[0, total_duration]`.
//! 2. Map it through the clip track to the recording and source time.
//! 3. Resolve each overlay track (zoom, masks, blurs, text, perspective,
//!    scenes, captions) at the clamped time.
//! 4. Collect keyboard presses lingering at that time.
//!
//! Composition is a pure function of its inputs; the same project and time
//! always yield the same frame.

use rk_common::{BaseVideo, EditorConfig, Rational, RenderParams, TimeCode, XY};

use crate::keyboard::visible_keys;
use crate::scene::evaluate_scene;
use crate::time_map::TimeMap;
use crate::track_eval::{evaluate_caption, evaluate_track};
use crate::types::Project;

/// Tunables for composition, derived from [`EditorConfig`].
#[derive(Clone, Debug, PartialEq)]
pub struct ComposeSettings {
    pub zoom_ramp: f64,
    pub perspective_ramp: f64,
    pub caption_fade: f64,
    pub keyboard_linger: f64,
    /// Frame rate used to quantize the base video position.
    pub fps: Rational,
    /// Normalized cursor position, followed by auto-mode zoom.
    pub cursor: Option<XY<f64>>,
}

impl From<&EditorConfig> for ComposeSettings {
    fn from(config: &EditorConfig) -> Self {
        Self {
            zoom_ramp: config.zoom_ramp_duration,
            perspective_ramp: config.perspective_ramp_duration,
            caption_fade: config.caption_fade_duration,
            keyboard_linger: config.keyboard_linger,
            fps: config.playback_fps,
            cursor: None,
        }
    }
}

impl Default for ComposeSettings {
    fn default() -> Self {
        Self::from(&EditorConfig::default())
    }
}

/// Compose the frame at `time` with default settings.
pub fn compose_frame(project: &Project, time: f64) -> RenderParams {
    let map = TimeMap::new(&project.timeline.clips);
    compose_frame_with(project, &map, time, &ComposeSettings::default())
}

/// Compose the frame at `time` using a prebuilt time map.
///
/// `map` must have been built from `project.timeline.clips`.
pub fn compose_frame_with(
    project: &Project,
    map: &TimeMap,
    time: f64,
    settings: &ComposeSettings,
) -> RenderParams {
    let total = map.total_duration();
    let time = if time.is_nan() {
        0.0
    } else {
        time.clamp(0.0, total)
    };
    let timeline = &project.timeline;

    let base = map.timeline_to_source(time).map(|pos| BaseVideo {
        segment_index: pos.segment_index,
        recording: pos.recording,
        source_time: pos.source_time,
        frame: TimeCode::from_secs(pos.source_time).as_frame(settings.fps),
    });

    let masks = evaluate_track(&timeline.masks, time, settings)
        .into_iter()
        .chain(evaluate_track(&timeline.blurs, time, settings))
        .collect();

    RenderParams {
        time,
        base,
        zoom: evaluate_track(&timeline.zoom, time, settings).unwrap_or_default(),
        masks,
        texts: evaluate_track(&timeline.texts, time, settings)
            .into_iter()
            .collect(),
        perspective: evaluate_track(&timeline.perspectives, time, settings).unwrap_or_default(),
        scene: evaluate_scene(&timeline.scenes, time),
        caption: evaluate_caption(&timeline.captions, &timeline.caption_defaults, time, settings),
        keys: visible_keys(map, &project.keyboard, time, settings.keyboard_linger),
        crop: project.crop,
        background: project.background.clone(),
        aspect_ratio: project.aspect_ratio,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rk_common::{AspectRatio, FrameNumber, MaskMode, RecordingRef, SceneMode, SceneState};

    use crate::types::{
        BlurParams, CaptionParams, ClipSegment, MaskParams, OverlaySegment, SceneParams,
        TextParams, ZoomMode, ZoomParams,
    };

    fn project() -> Project {
        let mut project = Project::from_recording(RecordingRef(0), 10.0);
        project.timeline.clips = vec![ClipSegment::new(0.0, 4.0), ClipSegment::new(6.0, 12.0)];
        project
    }

    #[test]
    fn bare_project_is_identity() {
        let frame = compose_frame(&project(), 1.0);
        assert!(frame.zoom.is_identity());
        assert!(frame.perspective.is_identity());
        assert!(frame.masks.is_empty());
        assert!(frame.texts.is_empty());
        assert!(frame.caption.is_none());
        let base = frame.base.unwrap();
        assert_eq!(base.segment_index, 0);
        assert!((base.source_time - 1.0).abs() < 1e-12);
    }

    #[test]
    fn base_video_carries_source_frame() {
        let p = project();
        let frame = compose_frame(&p, 5.0);
        assert_eq!(frame.base.unwrap().frame, FrameNumber(210));

        let settings = ComposeSettings {
            fps: Rational::FPS_60,
            ..ComposeSettings::default()
        };
        let map = TimeMap::new(&p.timeline.clips);
        let frame = compose_frame_with(&p, &map, 1.5, &settings);
        assert_eq!(frame.base.unwrap().frame, FrameNumber(90));
    }

    #[test]
    fn scene_track_sets_layout() {
        let mut p = project();
        p.timeline.scenes = vec![OverlaySegment::new(
            2.0,
            5.0,
            SceneParams {
                mode: SceneMode::HideCamera,
            },
        )];
        assert_eq!(compose_frame(&p, 3.0).scene.mode(), SceneMode::HideCamera);
        assert_eq!(compose_frame(&p, 3.0).scene.camera_opacity, 0.0);
        assert_eq!(compose_frame(&p, 8.0).scene, SceneState::DEFAULT);
    }

    #[test]
    fn base_video_crosses_cut() {
        let frame = compose_frame(&project(), 5.0);
        let base = frame.base.unwrap();
        assert_eq!(base.segment_index, 1);
        assert!((base.source_time - 7.0).abs() < 1e-12);
    }

    #[test]
    fn time_is_clamped() {
        let p = project();
        assert_eq!(compose_frame(&p, -3.0).time, 0.0);
        assert_eq!(compose_frame(&p, 99.0).time, 10.0);
        assert_eq!(compose_frame(&p, f64::NAN).time, 0.0);
        let end = compose_frame(&p, 99.0).base.unwrap();
        assert_eq!(end.source_time, 12.0);
    }

    #[test]
    fn empty_clip_track_has_no_base() {
        let mut p = project();
        p.timeline.clips.clear();
        let frame = compose_frame(&p, 1.0);
        assert!(frame.base.is_none());
        assert_eq!(frame.time, 0.0);
    }

    #[test]
    fn overlays_collected() {
        let mut p = project();
        p.aspect_ratio = Some(AspectRatio::Square);
        p.timeline.zoom = vec![OverlaySegment::new(
            2.0,
            8.0,
            ZoomParams {
                amount: 2.0,
                mode: ZoomMode::Manual,
                ..ZoomParams::default()
            },
        )];
        p.timeline.masks = vec![OverlaySegment::new(4.0, 6.0, MaskParams::default())];
        p.timeline.blurs = vec![OverlaySegment::new(3.0, 7.0, BlurParams::default())];
        p.timeline.texts = vec![OverlaySegment::new(0.0, 9.0, TextParams::default())];
        p.timeline.captions = vec![OverlaySegment::new(
            4.5,
            5.5,
            CaptionParams {
                text: "hi".into(),
                ..CaptionParams::default()
            },
        )];

        let frame = compose_frame(&p, 5.0);
        assert!((frame.zoom.amount - 2.0).abs() < 1e-9);
        assert_eq!(frame.masks.len(), 2);
        assert_eq!(frame.masks[0].mode, MaskMode::Sensitive);
        assert_eq!(frame.masks[1].mode, MaskMode::Blur);
        assert_eq!(frame.texts.len(), 1);
        assert_eq!(frame.caption.unwrap().text, "hi");
        assert_eq!(frame.aspect_ratio, Some(AspectRatio::Square));
    }

    #[test]
    fn composition_is_deterministic() {
        let mut p = project();
        p.timeline.zoom = vec![OverlaySegment::new(1.0, 3.0, ZoomParams::default())];
        for t in [0.0, 1.3, 2.9, 7.7] {
            assert_eq!(compose_frame(&p, t), compose_frame(&p, t));
        }
    }
}
