//! Segment store mutations.
//!
//! Every operation here is total over its clamped domain: edits that would
//! overlap a neighbour or invert a segment are clamped to the nearest valid
//! value, and edits that cannot be made valid (a too-small insertion gap, an
//! out-of-range index, a split producing a sliver) return `None` without
//! touching the track.
//!
//! Overlay tracks are plain `Vec<OverlaySegment<P>>` sorted by `start`, so a
//! segment's neighbours are always at `index - 1` and `index + 1` and every
//! clamp is `O(1)`. Insertion position is found with a binary search.
//!
//! # Usage
//!
//! ```ignore
//! let limits = EditLimits::new(&config, project.total_duration());
//! let track = &mut project.timeline.zoom;
//! let index = insert_at(track, 4.0, 3.0, ZoomParams::default(), &limits);
//! resize_edge(track, 0, Edge::End, 99.0, &limits); // clamped to the timeline end
//! ```

use rk_common::{EditorConfig, KeyframeEditPolicy, TIME_EPSILON, XY};
use rk_timeline_eval::{
    upsert_keyframe, ClipSegment, MaskSegment, OverlaySegment, TimeMap, Timeline, TrackParams,
    ZoomSegment,
};
use serde::{Deserialize, Serialize};

/// Which end of a segment an edit applies to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Edge {
    Start,
    End,
}

/// Bounds every overlay edit is clamped against.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EditLimits {
    /// Timeline length; overlays must stay inside `[0, total]`.
    pub total: f64,
    pub min_insert_gap: f64,
    pub min_segment_duration: f64,
}

impl EditLimits {
    pub fn new(config: &EditorConfig, total: f64) -> Self {
        Self {
            total: total.max(0.0),
            min_insert_gap: config.min_insert_gap,
            min_segment_duration: config.min_segment_duration,
        }
    }
}

/// Dispatch a generic overlay operation on a runtime [`TrackKind`].
///
/// The first arm binds the parameter type for the matched overlay track;
/// the `clip` arm handles the clip track.
///
/// [`TrackKind`]: rk_timeline_eval::TrackKind
macro_rules! dispatch_overlay {
    ($kind:expr, $p:ident => $body:expr, clip => $clip:expr $(,)?) => {
        match $kind {
            ::rk_timeline_eval::TrackKind::Zoom => {
                type $p = ::rk_timeline_eval::ZoomParams;
                $body
            }
            ::rk_timeline_eval::TrackKind::Mask => {
                type $p = ::rk_timeline_eval::MaskParams;
                $body
            }
            ::rk_timeline_eval::TrackKind::Text => {
                type $p = ::rk_timeline_eval::TextParams;
                $body
            }
            ::rk_timeline_eval::TrackKind::Blur => {
                type $p = ::rk_timeline_eval::BlurParams;
                $body
            }
            ::rk_timeline_eval::TrackKind::Perspective => {
                type $p = ::rk_timeline_eval::PerspectiveParams;
                $body
            }
            ::rk_timeline_eval::TrackKind::Caption => {
                type $p = ::rk_timeline_eval::CaptionParams;
                $body
            }
            ::rk_timeline_eval::TrackKind::Scene => {
                type $p = ::rk_timeline_eval::SceneParams;
                $body
            }
            ::rk_timeline_eval::TrackKind::Clip => $clip,
        }
    };
}
pub(crate) use dispatch_overlay;

fn valid(value: f64) -> bool {
    value.is_finite()
}

/// `value` clamped into `[lo, hi]`, or `fallback` when the range is empty.
fn clamp_or(value: f64, lo: f64, hi: f64, fallback: f64) -> f64 {
    if lo <= hi {
        value.clamp(lo, hi)
    } else {
        fallback
    }
}

/// Free space around segment `index`: previous end (or 0) and next start
/// (or the timeline end).
fn neighbour_bounds<P>(track: &[OverlaySegment<P>], index: usize, total: f64) -> (f64, f64) {
    let lo = index
        .checked_sub(1)
        .and_then(|i| track.get(i))
        .map_or(0.0, |prev| prev.end);
    let hi = track.get(index + 1).map_or(total, |next| next.start);
    (lo, hi)
}

// ---------------------------------------------------------------------------
// Overlay tracks
// ---------------------------------------------------------------------------

/// Insert a new segment at `time`, shrinking it to fit the free gap.
///
/// Returns the new segment's index, or `None` when `time` lies inside an
/// existing segment or the gap is smaller than `min_insert_gap`.
pub fn insert_at<P>(
    track: &mut Vec<OverlaySegment<P>>,
    time: f64,
    duration: f64,
    params: P,
    limits: &EditLimits,
) -> Option<usize> {
    if !valid(time) || !valid(duration) || duration <= 0.0 {
        return None;
    }
    let time = time.clamp(0.0, limits.total);
    let index = track.partition_point(|s| s.start <= time);

    if index > 0 && track[index - 1].end > time + TIME_EPSILON {
        tracing::debug!(time, "insert rejected: time is inside a segment");
        return None;
    }

    let gap_end = track.get(index).map_or(limits.total, |next| next.start);
    let end = (time + duration).min(gap_end);
    let available = end - time;
    if available <= TIME_EPSILON || available < limits.min_insert_gap - TIME_EPSILON {
        tracing::debug!(time, available, "insert rejected: gap too small");
        return None;
    }

    track.insert(index, OverlaySegment::new(time, end, params));
    Some(index)
}

/// Translate segment `index` by `delta` seconds, clamped so it never crosses
/// a neighbour or leaves the timeline. Returns the new `(start, end)`.
pub fn move_segment<P>(
    track: &mut [OverlaySegment<P>],
    index: usize,
    delta: f64,
    limits: &EditLimits,
) -> Option<(f64, f64)> {
    if !valid(delta) {
        return None;
    }
    let (lo, hi) = neighbour_bounds(track, index, limits.total);
    let segment = track.get_mut(index)?;
    let delta = clamp_or(delta, lo - segment.start, hi - segment.end, 0.0);
    segment.start += delta;
    segment.end += delta;
    Some((segment.start, segment.end))
}

/// Move one edge of segment `index` to `time`, clamped against the
/// neighbour on that side and `min_segment_duration`. Returns the new edge.
pub fn resize_edge<P: TrackParams>(
    track: &mut [OverlaySegment<P>],
    index: usize,
    edge: Edge,
    time: f64,
    limits: &EditLimits,
) -> Option<f64> {
    if !valid(time) {
        return None;
    }
    let (lo, hi) = neighbour_bounds(track, index, limits.total);
    let min = limits.min_segment_duration;
    let segment = track.get_mut(index)?;
    let value = match edge {
        Edge::Start => {
            segment.start = clamp_or(time, lo, segment.end - min, segment.start);
            segment.start
        }
        Edge::End => {
            segment.end = clamp_or(time, segment.start + min, hi, segment.end);
            segment.end
        }
    };
    let duration = segment.duration();
    segment.params.normalize(duration);
    Some(value)
}

/// Split segment `index` at timeline `time` into two abutting segments.
///
/// Keyframed parameters are re-based onto each half with the value at the
/// cut baked in. Returns the index of the right half.
pub fn split_at<P: TrackParams>(
    track: &mut Vec<OverlaySegment<P>>,
    index: usize,
    time: f64,
    limits: &EditLimits,
) -> Option<usize> {
    let segment = track.get(index)?;
    let min = limits.min_segment_duration - TIME_EPSILON;
    if !valid(time) || time - segment.start < min || segment.end - time < min {
        return None;
    }

    let (left, right) = segment.params.split(time - segment.start);
    let right = OverlaySegment {
        start: time,
        end: segment.end,
        enabled: segment.enabled,
        params: right,
    };
    let segment = &mut track[index];
    segment.end = time;
    segment.params = left;
    track.insert(index + 1, right);
    Some(index + 1)
}

/// Remove segment `index`. Overlay tracks keep the gap.
pub fn delete_segment<P>(track: &mut Vec<OverlaySegment<P>>, index: usize) -> Option<OverlaySegment<P>> {
    (index < track.len()).then(|| track.remove(index))
}

pub fn set_enabled<P>(track: &mut [OverlaySegment<P>], index: usize, enabled: bool) -> Option<()> {
    track.get_mut(index).map(|s| s.enabled = enabled)
}

/// Drop the animation on segment `index`, keeping its static values.
/// Returns `None` if the segment has no keyframes.
pub fn clear_animation<P: TrackParams>(track: &mut [OverlaySegment<P>], index: usize) -> Option<()> {
    let params = &mut track.get_mut(index)?.params;
    if !params.has_keyframes() {
        return None;
    }
    params.clear_keyframes();
    Some(())
}

/// Apply `edit` to the parameters of segment `index`.
pub fn update_params<P, R>(
    track: &mut [OverlaySegment<P>],
    index: usize,
    edit: impl FnOnce(&mut P) -> R,
) -> Option<R> {
    track.get_mut(index).map(|s| edit(&mut s.params))
}

/// Trim a track to `[0, total]`, dropping segments left with no length.
/// Returns `true` if anything changed.
pub fn clamp_track<P: TrackParams>(track: &mut Vec<OverlaySegment<P>>, total: f64) -> bool {
    let before = track.len();
    track.retain(|s| s.start < total - TIME_EPSILON);
    let mut changed = track.len() != before;
    for segment in track.iter_mut() {
        if segment.end > total {
            segment.end = total;
            let duration = segment.duration();
            segment.params.normalize(duration);
            changed = true;
        }
    }
    changed
}

/// Keep every overlay track inside the timeline after a clip-track edit.
pub fn clamp_overlays(timeline: &mut Timeline) -> bool {
    use rk_timeline_eval::{
        BlurParams, CaptionParams, MaskParams, PerspectiveParams, SceneParams, TextParams,
        ZoomParams,
    };

    fn clamp<P: TrackParams>(timeline: &mut Timeline, total: f64) -> bool {
        let changed = clamp_track(P::track_mut(timeline), total);
        if changed {
            tracing::debug!(track = %P::KIND, total, "clamped overlays to timeline");
        }
        changed
    }

    let total = timeline.total_duration();
    let mut changed = clamp::<ZoomParams>(timeline, total);
    changed |= clamp::<MaskParams>(timeline, total);
    changed |= clamp::<TextParams>(timeline, total);
    changed |= clamp::<BlurParams>(timeline, total);
    changed |= clamp::<PerspectiveParams>(timeline, total);
    changed |= clamp::<CaptionParams>(timeline, total);
    changed |= clamp::<SceneParams>(timeline, total);
    changed
}

// ---------------------------------------------------------------------------
// Clip track
// ---------------------------------------------------------------------------

/// Split clip `index` at `fraction` of its length into two contiguous clips.
///
/// Both pieces must last at least `min_duration` on the timeline. Returns
/// the index of the right piece.
pub fn split_clip(
    clips: &mut Vec<ClipSegment>,
    index: usize,
    fraction: f64,
    min_duration: f64,
) -> Option<usize> {
    let clip = clips.get(index)?;
    if !valid(fraction) || fraction <= 0.0 || fraction >= 1.0 {
        return None;
    }
    let duration = clip.duration();
    let min = min_duration - TIME_EPSILON;
    if duration * fraction < min || duration * (1.0 - fraction) < min {
        return None;
    }

    let cut = clip.start + (clip.end - clip.start) * fraction;
    let right = ClipSegment {
        start: cut,
        ..clip.clone()
    };
    clips[index].end = cut;
    clips.insert(index + 1, right);
    Some(index + 1)
}

/// Split whichever clip plays at timeline time `t`.
pub fn split_clip_at_time(
    clips: &mut Vec<ClipSegment>,
    t: f64,
    min_duration: f64,
) -> Option<usize> {
    if !valid(t) {
        return None;
    }
    let map = TimeMap::new(clips);
    let index = map.segment_at(t)?;
    let (start, end) = map.timeline_range(index)?;
    if end - start <= TIME_EPSILON {
        return None;
    }
    split_clip(clips, index, (t - start) / (end - start), min_duration)
}

/// Move one source edge of clip `index` to `source_time`.
///
/// Clamped to `[0, max_source]`, to `min_duration` on the timeline axis, and
/// against the neighbouring clip's source range when both slice the same
/// recording. Returns the new edge.
pub fn resize_clip(
    clips: &mut [ClipSegment],
    index: usize,
    edge: Edge,
    source_time: f64,
    max_source: f64,
    min_duration: f64,
) -> Option<f64> {
    if !valid(source_time) {
        return None;
    }
    let clip = clips.get(index)?;
    let min_source = min_duration * clip.timescale;
    let value = match edge {
        Edge::Start => {
            let lo = match index.checked_sub(1).and_then(|i| clips.get(i)) {
                Some(prev)
                    if prev.recording == clip.recording && prev.end <= clip.start + TIME_EPSILON =>
                {
                    prev.end
                }
                _ => 0.0,
            };
            clamp_or(source_time, lo, clip.end - min_source, clip.start)
        }
        Edge::End => {
            let hi = match clips.get(index + 1) {
                Some(next)
                    if next.recording == clip.recording && next.start >= clip.end - TIME_EPSILON =>
                {
                    next.start.min(max_source)
                }
                _ => max_source,
            };
            clamp_or(source_time, clip.start + min_source, hi, clip.end)
        }
    };

    let clip = &mut clips[index];
    match edge {
        Edge::Start => clip.start = value,
        Edge::End => clip.end = value,
    }
    Some(value)
}

/// Set clip `index`'s playback speed, clamped to `[min, max]`.
pub fn set_clip_timescale(
    clips: &mut [ClipSegment],
    index: usize,
    timescale: f64,
    min: f64,
    max: f64,
) -> Option<f64> {
    if !valid(timescale) {
        return None;
    }
    let clip = clips.get_mut(index)?;
    clip.timescale = clamp_or(timescale, min, max, clip.timescale);
    Some(clip.timescale)
}

/// Remove clip `index`. The track is gapless by construction, so later
/// clips simply move up. The last remaining clip cannot be deleted.
pub fn delete_clip(clips: &mut Vec<ClipSegment>, index: usize) -> Option<ClipSegment> {
    if clips.len() <= 1 || index >= clips.len() {
        return None;
    }
    Some(clips.remove(index))
}

// ---------------------------------------------------------------------------
// Geometry edits under a keyframe policy
// ---------------------------------------------------------------------------

/// Local offset of `playhead` inside a segment, clamped to its span.
fn local_time<P>(segment: &OverlaySegment<P>, playhead: f64) -> f64 {
    (playhead - segment.start).clamp(0.0, segment.duration())
}

/// Set a mask's position and size.
///
/// With [`KeyframeEditPolicy::BakeOut`] all animation is replaced by the new
/// static geometry. With `UpsertAtPlayhead` the geometry is written as a
/// keyframe at the playhead, or as static values if the mask has no
/// position/size animation yet.
pub fn set_mask_geometry(
    track: &mut [MaskSegment],
    index: usize,
    center: XY<f64>,
    size: XY<f64>,
    policy: KeyframeEditPolicy,
    playhead: f64,
) -> Option<()> {
    let segment = track.get_mut(index)?;
    let local = local_time(segment, playhead);
    let params = &mut segment.params;
    match policy {
        KeyframeEditPolicy::BakeOut => {
            params.center = center;
            params.size = size;
            params.keyframes.position.clear();
            params.keyframes.size.clear();
        }
        KeyframeEditPolicy::UpsertAtPlayhead => {
            if params.keyframes.position.is_empty() {
                params.center = center;
            } else {
                upsert_keyframe(&mut params.keyframes.position, local, center);
            }
            if params.keyframes.size.is_empty() {
                params.size = size;
            } else {
                upsert_keyframe(&mut params.keyframes.size, local, size);
            }
        }
    }
    Some(())
}

/// Set a zoom segment's magnification and focus point, under the same
/// policy as [`set_mask_geometry`].
pub fn set_zoom_focus(
    track: &mut [ZoomSegment],
    index: usize,
    amount: f64,
    center: XY<f64>,
    policy: KeyframeEditPolicy,
    playhead: f64,
) -> Option<()> {
    if !valid(amount) {
        return None;
    }
    let segment = track.get_mut(index)?;
    let local = local_time(segment, playhead);
    let amount = amount.max(1.0);
    let center = center.clamp(0.0, 1.0);
    let params = &mut segment.params;
    match policy {
        KeyframeEditPolicy::BakeOut => {
            params.amount = amount;
            params.center = center;
            params.clear_keyframes();
        }
        KeyframeEditPolicy::UpsertAtPlayhead => {
            if params.keyframes.amount.is_empty() {
                params.amount = amount;
            } else {
                upsert_keyframe(&mut params.keyframes.amount, local, amount);
            }
            if params.keyframes.center.is_empty() {
                params.center = center;
            } else {
                upsert_keyframe(&mut params.keyframes.center, local, center);
            }
        }
    }
    Some(())
}
