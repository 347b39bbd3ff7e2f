//! Per-track evaluation: resolve one overlay track at an instant.
//!
//! Each evaluator finds the single enabled segment covering the instant
//! (tracks are sorted and non-overlapping, so a binary search suffices),
//! interpolates its keyframes, and applies the track's fade or ramp.
//!
//! Zoom and perspective ramp *inside* their segment: a segment ramps from
//! rest to its target over the first `ramp` seconds and back over the last.
//! When a segment directly abuts an enabled predecessor, it ramps from the
//! predecessor's final value instead, and the predecessor skips its ramp-out.

use rk_common::{CaptionFrame, MaskMode, MaskRect, PerspectivePose, TextBox, ZoomTransform, XY};

use crate::easing::CubicBezier;
use crate::evaluator::ComposeSettings;
use crate::keyframe::{evaluate_keyframes, Lerp};
use crate::transition::{adjacency, compute_progress, fade_envelope, fade_windows, segment_fade};
use crate::types::{
    BlurParams, CaptionParams, CaptionStyleOverride, MaskKind, MaskParams, OverlaySegment,
    PerspectiveParams, TextParams, ZoomMode, ZoomParams,
};

const MIN_MASK_SIZE: f64 = 0.01;
const MAX_MASK_SIZE: f64 = 2.0;

impl Lerp for ZoomTransform {
    fn lerp(self, other: Self, t: f64) -> Self {
        ZoomTransform {
            amount: self.amount.lerp(other.amount, t),
            center: XY::<f64>::lerp(self.center, other.center, t),
        }
    }
}

impl Lerp for PerspectivePose {
    fn lerp(self, other: Self, t: f64) -> Self {
        PerspectivePose {
            rotation_x: self.rotation_x.lerp(other.rotation_x, t),
            rotation_y: self.rotation_y.lerp(other.rotation_y, t),
            depth: self.depth.lerp(other.depth, t),
        }
    }
}

/// Index of the enabled segment covering `time`, if any.
pub fn active_index<P>(track: &[OverlaySegment<P>], time: f64) -> Option<usize> {
    // Segments starting at or before `time`; the last of them is the only candidate.
    let candidates = track.partition_point(|s| s.start <= time);
    let index = candidates.checked_sub(1)?;
    track[index].is_active_at(time).then_some(index)
}

/// A track whose active segment resolves to a renderable state.
pub trait Evaluate: Sized {
    type State;

    /// Resolve `track[index]` at absolute timeline `time`.
    fn evaluate(
        track: &[OverlaySegment<Self>],
        index: usize,
        time: f64,
        settings: &ComposeSettings,
    ) -> Self::State;
}

/// Evaluate whichever segment of `track` is active at `time`.
pub fn evaluate_track<P: Evaluate>(
    track: &[OverlaySegment<P>],
    time: f64,
    settings: &ComposeSettings,
) -> Option<P::State> {
    let index = active_index(track, time)?;
    Some(P::evaluate(track, index, time, settings))
}

/// Ramp `track[index]` between rest and its target value.
///
/// `target` gives the segment's value at a local time, `rest` the value it
/// ramps from and back to, and `curve` the easing for a given move.
fn ramp_segment<P, V: Lerp>(
    track: &[OverlaySegment<P>],
    index: usize,
    time: f64,
    ramp: f64,
    target: impl Fn(&OverlaySegment<P>, f64) -> V,
    rest: impl Fn(V) -> V,
    curve: impl Fn(V, V) -> CubicBezier,
) -> V {
    let segment = &track[index];
    let duration = segment.duration();
    let local = time - segment.start;
    let goal = target(segment, local);

    // Abutting neighbours hand over directly, so use zero tolerance.
    let adjacent = adjacency(track, index, 0.0);
    let from = if adjacent.before {
        let prev = &track[index - 1];
        target(prev, prev.duration())
    } else {
        rest(goal)
    };

    let ramp_out = if adjacent.after { 0.0 } else { ramp };
    let (ramp_in, ramp_out) = fade_windows(duration, ramp, ramp_out);

    let mut value = goal;
    let entering = compute_progress(local, 0.0, ramp_in);
    if entering < 1.0 {
        value = from.lerp(goal, curve(from, goal).ease(entering));
    }
    let leaving = compute_progress(duration - local, 0.0, ramp_out);
    if leaving < 1.0 {
        let end = rest(goal);
        value = value.lerp(end, curve(value, end).ease(1.0 - leaving));
    }
    value
}

/// The zoom a segment aims for at `local` seconds, before ramping.
fn zoom_target(
    segment: &OverlaySegment<ZoomParams>,
    local: f64,
    cursor: Option<XY<f64>>,
) -> ZoomTransform {
    let params = &segment.params;
    let amount = evaluate_keyframes(&params.keyframes.amount, local, params.amount).max(1.0);
    let keyed_center = evaluate_keyframes(&params.keyframes.center, local, params.center);
    let center = match params.mode {
        ZoomMode::Auto => cursor.unwrap_or(keyed_center),
        ZoomMode::Manual => keyed_center,
    };
    ZoomTransform {
        amount,
        center: center.clamp(0.0, 1.0),
    }
}

impl Evaluate for ZoomParams {
    type State = ZoomTransform;

    fn evaluate(
        track: &[OverlaySegment<Self>],
        index: usize,
        time: f64,
        settings: &ComposeSettings,
    ) -> ZoomTransform {
        ramp_segment(
            track,
            index,
            time,
            settings.zoom_ramp,
            |segment, local| zoom_target(segment, local, settings.cursor),
            |goal| ZoomTransform {
                amount: 1.0,
                center: goal.center,
            },
            |from, to| CubicBezier::for_ramp(from.amount, to.amount),
        )
    }
}

impl Evaluate for PerspectiveParams {
    type State = PerspectivePose;

    fn evaluate(
        track: &[OverlaySegment<Self>],
        index: usize,
        time: f64,
        settings: &ComposeSettings,
    ) -> PerspectivePose {
        let ramp = track[index].params.ramp.unwrap_or(settings.perspective_ramp);
        ramp_segment(
            track,
            index,
            time,
            ramp,
            |segment, _| PerspectivePose {
                rotation_x: segment.params.rotation_x,
                rotation_y: segment.params.rotation_y,
                depth: segment.params.depth,
            },
            |_| PerspectivePose::IDENTITY,
            |_, _| CubicBezier::EASE_IN_OUT,
        )
    }
}

fn clamp_size(size: XY<f64>) -> XY<f64> {
    size.clamp(MIN_MASK_SIZE, MAX_MASK_SIZE)
}

impl Evaluate for MaskParams {
    type State = MaskRect;

    fn evaluate(
        track: &[OverlaySegment<Self>],
        index: usize,
        time: f64,
        _settings: &ComposeSettings,
    ) -> MaskRect {
        let segment = &track[index];
        let params = &segment.params;
        let keys = &params.keyframes;
        let local = time - segment.start;

        let center = evaluate_keyframes(&keys.position, local, params.center);
        let size = evaluate_keyframes(&keys.size, local, params.size);
        let base_intensity = evaluate_keyframes(&keys.intensity, local, params.opacity);
        let fade = segment_fade(track, index, time, params.fade_duration);

        let (mode, feather) = match params.kind {
            MaskKind::Sensitive => (MaskMode::Sensitive, params.feather.max(0.0)),
            MaskKind::Highlight => (MaskMode::Highlight, 0.0),
        };

        MaskRect {
            mode,
            center,
            size: clamp_size(size),
            feather,
            opacity: fade,
            intensity: (base_intensity * fade).clamp(0.0, 1.0),
            pixelation: params.pixelation.max(1.0),
            darkness: params.darkness.clamp(0.0, 1.0),
            blur_amount: 0.0,
        }
    }
}

impl Evaluate for BlurParams {
    type State = MaskRect;

    fn evaluate(
        track: &[OverlaySegment<Self>],
        index: usize,
        time: f64,
        _settings: &ComposeSettings,
    ) -> MaskRect {
        let segment = &track[index];
        let params = &segment.params;
        let fade = segment_fade(track, index, time, params.fade_duration);

        MaskRect {
            mode: MaskMode::Blur,
            center: params.center,
            size: clamp_size(params.size),
            feather: params.feather.max(0.0),
            opacity: fade,
            intensity: fade,
            pixelation: 0.0,
            darkness: 0.0,
            blur_amount: params.amount.max(0.0),
        }
    }
}

impl Evaluate for TextParams {
    type State = TextBox;

    fn evaluate(
        track: &[OverlaySegment<Self>],
        index: usize,
        time: f64,
        _settings: &ComposeSettings,
    ) -> TextBox {
        let segment = &track[index];
        let params = &segment.params;
        let local = time - segment.start;
        let fade = params.fade_duration;

        TextBox {
            content: params.content.clone(),
            center: evaluate_keyframes(&params.position_keyframes, local, params.center),
            size: params.size,
            font: params.font.clone(),
            opacity: fade_envelope(local, segment.duration(), fade, fade),
        }
    }
}

/// The caption shown at `time`, with its style resolved against the
/// track defaults. Blank captions render nothing.
pub fn evaluate_caption(
    track: &[OverlaySegment<CaptionParams>],
    track_style: &CaptionStyleOverride,
    time: f64,
    settings: &ComposeSettings,
) -> Option<CaptionFrame> {
    let index = active_index(track, time)?;
    let segment = &track[index];
    if segment.params.text.trim().is_empty() {
        return None;
    }
    let fade = settings.caption_fade;
    Some(CaptionFrame {
        text: segment.params.text.clone(),
        style: segment.params.style.resolve(track_style),
        opacity: fade_envelope(time - segment.start, segment.duration(), fade, fade),
    })
}
