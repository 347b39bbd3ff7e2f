//! Editor configuration: default segment durations, editing limits, ramp
//! timings, viewport bounds, history depth, and playback rate.
//!
//! Every field has a serde default so partial JSON documents load cleanly:
//!
//! ```ignore
//! let config = EditorConfig::from_json_str(r#"{ "minInsertGap": 0.5 }"#)?;
//! assert_eq!(config.min_segment_duration, 1.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::types::Rational;

/// Default length of a freshly inserted overlay segment, per track.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DefaultDurations {
    pub zoom: f64,
    pub mask: f64,
    pub text: f64,
    pub blur: f64,
    pub perspective: f64,
    pub caption: f64,
    pub scene: f64,
}

impl Default for DefaultDurations {
    fn default() -> Self {
        Self {
            zoom: 3.0,
            mask: 3.0,
            text: 3.0,
            blur: 3.0,
            perspective: 3.0,
            caption: 3.0,
            scene: 5.0,
        }
    }
}

/// Bounds for the timeline viewport transform.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewportLimits {
    /// Smallest number of visible seconds (maximum zoom-in).
    pub min_zoom_in: f64,
    /// Largest number of visible seconds (maximum zoom-out).
    pub zoom_out_limit: f64,
    /// Scroll room past the end of the timeline, in seconds.
    pub slack: f64,
}

impl Default for ViewportLimits {
    fn default() -> Self {
        Self {
            min_zoom_in: 1.0,
            zoom_out_limit: 600.0,
            slack: 5.0,
        }
    }
}

/// What happens to keyframe arrays when segment geometry is edited by hand.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KeyframeEditPolicy {
    /// Replace animation with the edited static value.
    #[default]
    BakeOut,
    /// Keep animation and write the edited value as a keyframe at the playhead.
    UpsertAtPlayhead,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    pub default_durations: DefaultDurations,
    /// Insertions into a gap smaller than this are rejected.
    pub min_insert_gap: f64,
    /// Shortest segment any resize or split may produce.
    pub min_segment_duration: f64,
    /// Fade applied to new text segments.
    pub text_fade_duration: f64,
    /// Fade applied to new blur segments.
    pub blur_fade_duration: f64,
    /// Fade applied to new mask segments.
    pub mask_fade_duration: f64,
    /// Fade in/out for every caption.
    pub caption_fade_duration: f64,
    /// Time taken to ramp into and out of a zoom segment.
    pub zoom_ramp_duration: f64,
    /// Time taken to ramp into and out of a perspective segment.
    pub perspective_ramp_duration: f64,
    /// How long a key press stays on screen after release.
    pub keyboard_linger: f64,
    pub min_timescale: f64,
    pub max_timescale: f64,
    pub viewport: ViewportLimits,
    /// Pointer travel below which a drag is treated as a click.
    pub drag_threshold_px: f64,
    pub history_depth: usize,
    pub playback_fps: Rational,
    /// Quiet period after the last edit before an auto-save fires.
    pub autosave_debounce_secs: f64,
    pub keyframe_edit_policy: KeyframeEditPolicy,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            default_durations: DefaultDurations::default(),
            min_insert_gap: 1.0,
            min_segment_duration: 1.0,
            text_fade_duration: 0.15,
            blur_fade_duration: 0.15,
            mask_fade_duration: 0.15,
            caption_fade_duration: 0.15,
            zoom_ramp_duration: 1.0,
            perspective_ramp_duration: 0.4,
            keyboard_linger: 0.85,
            min_timescale: 0.25,
            max_timescale: 4.0,
            viewport: ViewportLimits::default(),
            drag_threshold_px: 2.0,
            history_depth: 100,
            playback_fps: Rational::FPS_30,
            autosave_debounce_secs: 1.0,
            keyframe_edit_policy: KeyframeEditPolicy::BakeOut,
        }
    }
}

impl EditorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a (possibly partial) JSON document and sanitize the result.
    pub fn from_json_str(json: &str) -> Result<Self, EngineError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| EngineError::Config(e.to_string()))?;
        Ok(config.sanitized())
    }

    /// Replace out-of-range values so downstream clamping math stays sound.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();

        fn positive(value: f64, fallback: f64) -> f64 {
            if value.is_finite() && value > 0.0 {
                value
            } else {
                fallback
            }
        }

        fn non_negative(value: f64, fallback: f64) -> f64 {
            if value.is_finite() && value >= 0.0 {
                value
            } else {
                fallback
            }
        }

        let d = &mut self.default_durations;
        let dd = &defaults.default_durations;
        d.zoom = positive(d.zoom, dd.zoom);
        d.mask = positive(d.mask, dd.mask);
        d.text = positive(d.text, dd.text);
        d.blur = positive(d.blur, dd.blur);
        d.perspective = positive(d.perspective, dd.perspective);
        d.caption = positive(d.caption, dd.caption);
        d.scene = positive(d.scene, dd.scene);

        self.min_segment_duration =
            positive(self.min_segment_duration, defaults.min_segment_duration);
        self.min_insert_gap = non_negative(self.min_insert_gap, defaults.min_insert_gap);
        self.text_fade_duration = non_negative(self.text_fade_duration, 0.0);
        self.blur_fade_duration = non_negative(self.blur_fade_duration, 0.0);
        self.mask_fade_duration = non_negative(self.mask_fade_duration, 0.0);
        self.caption_fade_duration = non_negative(self.caption_fade_duration, 0.0);
        self.zoom_ramp_duration = non_negative(self.zoom_ramp_duration, 0.0);
        self.perspective_ramp_duration = non_negative(self.perspective_ramp_duration, 0.0);
        self.keyboard_linger = non_negative(self.keyboard_linger, 0.0);

        self.min_timescale = positive(self.min_timescale, defaults.min_timescale);
        self.max_timescale = positive(self.max_timescale, defaults.max_timescale);
        if self.max_timescale < self.min_timescale {
            std::mem::swap(&mut self.min_timescale, &mut self.max_timescale);
        }

        let v = &mut self.viewport;
        v.min_zoom_in = positive(v.min_zoom_in, defaults.viewport.min_zoom_in);
        v.zoom_out_limit = positive(v.zoom_out_limit, defaults.viewport.zoom_out_limit);
        v.slack = non_negative(v.slack, defaults.viewport.slack);
        if v.zoom_out_limit < v.min_zoom_in {
            v.zoom_out_limit = v.min_zoom_in;
        }

        self.drag_threshold_px = non_negative(self.drag_threshold_px, defaults.drag_threshold_px);
        if self.playback_fps.num == 0 || self.playback_fps.den == 0 {
            self.playback_fps = defaults.playback_fps;
        }
        self.autosave_debounce_secs =
            non_negative(self.autosave_debounce_secs, defaults.autosave_debounce_secs);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config = EditorConfig::from_json_str(
            r#"{ "minInsertGap": 0.5, "defaultDurations": { "zoom": 2.0 } }"#,
        )
        .unwrap();
        assert_eq!(config.min_insert_gap, 0.5);
        assert_eq!(config.default_durations.zoom, 2.0);
        assert_eq!(config.default_durations.mask, 3.0);
        assert_eq!(config.min_segment_duration, 1.0);
        assert_eq!(config.keyframe_edit_policy, KeyframeEditPolicy::BakeOut);
    }

    #[test]
    fn policy_parses_camel_case() {
        let config =
            EditorConfig::from_json_str(r#"{ "keyframeEditPolicy": "upsertAtPlayhead" }"#)
                .unwrap();
        assert_eq!(
            config.keyframe_edit_policy,
            KeyframeEditPolicy::UpsertAtPlayhead
        );
    }

    #[test]
    fn invalid_json_is_config_error() {
        let err = EditorConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn sanitize_replaces_bad_values() {
        let mut config = EditorConfig::default();
        config.min_segment_duration = -1.0;
        config.default_durations.text = f64::NAN;
        config.viewport.zoom_out_limit = 0.5;
        config.min_timescale = 8.0;
        config.max_timescale = 2.0;
        config.playback_fps = Rational { num: 0, den: 1 };

        let config = config.sanitized();
        assert_eq!(config.min_segment_duration, 1.0);
        assert_eq!(config.default_durations.text, 3.0);
        assert_eq!(config.viewport.zoom_out_limit, config.viewport.min_zoom_in);
        assert_eq!((config.min_timescale, config.max_timescale), (2.0, 8.0));
        assert_eq!(config.playback_fps, Rational::FPS_30);
    }

    #[test]
    fn serde_roundtrip() {
        let config = EditorConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: EditorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
