//! Structural checks and repair for timelines.
//!
//! [`validate_timeline`] reports the first violation it finds.
//! [`normalize_project`] repairs a project loaded from disk so that every
//! track satisfies the ordering and non-overlap rules the editor relies on.

use rk_common::TIME_EPSILON;

use crate::error::TimelineEvalError;
use crate::types::{
    BlurParams, CaptionParams, MaskParams, OverlaySegment, PerspectiveParams, Project,
    SceneParams, TextParams, Timeline, TrackKind, TrackParams, ZoomParams,
};

/// Check every track: clips non-empty with positive timescale, overlays
/// sorted, non-overlapping, `end > start`, and within the timeline.
pub fn validate_timeline(timeline: &Timeline) -> Result<(), TimelineEvalError> {
    if timeline.clips.is_empty() {
        return Err(TimelineEvalError::EmptyTimeline);
    }
    for (index, clip) in timeline.clips.iter().enumerate() {
        if !valid_timescale(clip.timescale) {
            return Err(TimelineEvalError::InvalidTimescale {
                index,
                timescale: clip.timescale,
            });
        }
        if clip.end <= clip.start {
            return Err(TimelineEvalError::InvertedSegment {
                kind: TrackKind::Clip,
                index,
                start: clip.start,
                end: clip.end,
            });
        }
    }

    let total = timeline.total_duration();
    validate_track::<ZoomParams>(timeline, total)?;
    validate_track::<MaskParams>(timeline, total)?;
    validate_track::<TextParams>(timeline, total)?;
    validate_track::<BlurParams>(timeline, total)?;
    validate_track::<PerspectiveParams>(timeline, total)?;
    validate_track::<CaptionParams>(timeline, total)?;
    validate_track::<SceneParams>(timeline, total)?;
    Ok(())
}

fn valid_timescale(timescale: f64) -> bool {
    timescale.is_finite() && timescale > 0.0
}

fn ordered(start: f64, end: f64) -> bool {
    start.is_finite() && end.is_finite() && end > start
}

fn validate_track<P: TrackParams>(
    timeline: &Timeline,
    total: f64,
) -> Result<(), TimelineEvalError> {
    let track = P::track(timeline);
    for (index, segment) in track.iter().enumerate() {
        if !ordered(segment.start, segment.end) {
            return Err(TimelineEvalError::InvertedSegment {
                kind: P::KIND,
                index,
                start: segment.start,
                end: segment.end,
            });
        }
        if segment.end > total + TIME_EPSILON {
            return Err(TimelineEvalError::OutOfRange {
                kind: P::KIND,
                index,
                end: segment.end,
                total,
            });
        }
        if index > 0 {
            let prev = &track[index - 1];
            if segment.start < prev.start {
                return Err(TimelineEvalError::Unsorted {
                    kind: P::KIND,
                    index,
                });
            }
            if segment.start < prev.end - TIME_EPSILON {
                return Err(TimelineEvalError::Overlap {
                    kind: P::KIND,
                    first: index - 1,
                    second: index,
                });
            }
        }
    }
    Ok(())
}

/// Repair a timeline in place. Returns `true` if anything changed.
///
/// Clips with no length are dropped and bad timescales reset to `1.0`.
/// Overlay tracks are sorted, trimmed to the timeline, and overlaps are
/// resolved by pushing the later segment's start to the earlier one's end.
/// Keyframes are sorted and trimmed to their segment.
pub fn normalize_timeline(timeline: &mut Timeline) -> bool {
    let mut changed = false;

    let before = timeline.clips.len();
    timeline.clips.retain(|c| ordered(c.start, c.end));
    if timeline.clips.len() != before {
        tracing::warn!(
            dropped = before - timeline.clips.len(),
            "dropping empty clip segments"
        );
        changed = true;
    }
    for clip in &mut timeline.clips {
        if !valid_timescale(clip.timescale) {
            tracing::warn!(timescale = clip.timescale, "resetting invalid clip timescale");
            clip.timescale = 1.0;
            changed = true;
        }
    }

    let total = timeline.total_duration();
    changed |= normalize_track::<ZoomParams>(timeline, total);
    changed |= normalize_track::<MaskParams>(timeline, total);
    changed |= normalize_track::<TextParams>(timeline, total);
    changed |= normalize_track::<BlurParams>(timeline, total);
    changed |= normalize_track::<PerspectiveParams>(timeline, total);
    changed |= normalize_track::<CaptionParams>(timeline, total);
    changed |= normalize_track::<SceneParams>(timeline, total);
    changed
}

/// Normalize the timeline and sort the keyboard log by source time.
pub fn normalize_project(project: &mut Project) -> bool {
    let mut changed = normalize_timeline(&mut project.timeline);
    let before = project.keyboard.len();
    project.keyboard.retain(|k| k.time.is_finite());
    if !project
        .keyboard
        .windows(2)
        .all(|w| w[0].time <= w[1].time)
    {
        project.keyboard.sort_by(|a, b| a.time.total_cmp(&b.time));
        changed = true;
    }
    changed || project.keyboard.len() != before
}

fn normalize_track<P: TrackParams>(timeline: &mut Timeline, total: f64) -> bool {
    let track = P::track_mut(timeline);
    let original = track.clone();

    track.retain(|s| s.start.is_finite() && s.end.is_finite());
    track.sort_by(|a, b| a.start.total_cmp(&b.start));

    let mut repaired: Vec<OverlaySegment<P>> = Vec::with_capacity(track.len());
    for mut segment in track.drain(..) {
        segment.start = segment.start.max(0.0);
        segment.end = segment.end.min(total);
        if let Some(prev) = repaired.last() {
            if segment.start < prev.end {
                segment.start = prev.end;
            }
        }
        if segment.end - segment.start <= TIME_EPSILON {
            continue;
        }
        segment.params.normalize(segment.duration());
        repaired.push(segment);
    }
    *track = repaired;

    let changed = *track != original;
    if changed {
        tracing::debug!(
            kind = %P::KIND,
            before = original.len(),
            after = track.len(),
            "normalized track"
        );
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyframe::Keyframe;
    use crate::types::{ClipSegment, KeyPressEvent};

    fn timeline(duration: f64) -> Timeline {
        Timeline {
            clips: vec![ClipSegment::new(0.0, duration)],
            ..Timeline::default()
        }
    }

    fn zoom(start: f64, end: f64) -> OverlaySegment<ZoomParams> {
        OverlaySegment::new(start, end, ZoomParams::default())
    }

    #[test]
    fn valid_timeline_passes() {
        let mut t = timeline(10.0);
        t.zoom = vec![zoom(0.0, 2.0), zoom(2.0, 4.0)];
        assert_eq!(validate_timeline(&t), Ok(()));
    }

    #[test]
    fn empty_timeline_rejected() {
        assert_eq!(
            validate_timeline(&Timeline::default()),
            Err(TimelineEvalError::EmptyTimeline)
        );
    }

    #[test]
    fn overlap_reported() {
        let mut t = timeline(10.0);
        t.zoom = vec![zoom(0.0, 3.0), zoom(2.0, 4.0)];
        assert_eq!(
            validate_timeline(&t),
            Err(TimelineEvalError::Overlap {
                kind: TrackKind::Zoom,
                first: 0,
                second: 1
            })
        );
    }

    #[test]
    fn zero_timescale_rejected() {
        let mut t = timeline(10.0);
        t.clips[0].timescale = 0.0;
        assert!(matches!(
            validate_timeline(&t),
            Err(TimelineEvalError::InvalidTimescale { index: 0, .. })
        ));
    }

    #[test]
    fn normalize_sorts_and_resolves_overlap() {
        let mut t = timeline(10.0);
        t.zoom = vec![zoom(5.0, 7.0), zoom(0.0, 6.0), zoom(8.0, 12.0)];
        assert!(normalize_timeline(&mut t));

        let bounds: Vec<(f64, f64)> = t.zoom.iter().map(|s| (s.start, s.end)).collect();
        assert_eq!(bounds, vec![(0.0, 6.0), (6.0, 7.0), (8.0, 10.0)]);
        assert_eq!(validate_timeline(&t), Ok(()));
    }

    #[test]
    fn normalize_drops_swallowed_segments() {
        let mut t = timeline(10.0);
        t.zoom = vec![zoom(0.0, 6.0), zoom(1.0, 5.0), zoom(11.0, 12.0)];
        normalize_timeline(&mut t);
        assert_eq!(t.zoom.len(), 1);
    }

    #[test]
    fn normalize_is_idempotent() {
        let mut t = timeline(10.0);
        t.zoom = vec![zoom(0.0, 2.0)];
        assert!(!normalize_timeline(&mut t));
    }

    #[test]
    fn normalize_trims_keyframes() {
        let mut t = timeline(10.0);
        let mut segment = zoom(0.0, 2.0);
        segment.params.keyframes.amount = vec![
            Keyframe::linear(3.0, 2.0),
            Keyframe::linear(1.0, 1.5),
        ];
        t.zoom = vec![segment];
        normalize_timeline(&mut t);
        assert_eq!(t.zoom[0].params.keyframes.amount.len(), 1);
        assert_eq!(t.zoom[0].params.keyframes.amount[0].time, 1.0);
    }

    #[test]
    fn normalize_project_sorts_keyboard() {
        let mut project = Project::from_recording(Default::default(), 5.0);
        project.keyboard = vec![
            KeyPressEvent {
                key: "b".into(),
                time: 2.0,
                down: true,
                modifiers: Vec::new(),
            },
            KeyPressEvent {
                key: "a".into(),
                time: 1.0,
                down: true,
                modifiers: Vec::new(),
            },
        ];
        assert!(normalize_project(&mut project));
        assert_eq!(project.keyboard[0].key, "a");
    }
}
