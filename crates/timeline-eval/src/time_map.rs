//! Bidirectional mapping between timeline time and source time.
//!
//! Clip segments are laid end to end; segment `i` occupies
//! `[starts[i], starts[i + 1])` on the timeline and maps linearly onto
//! `[clip.start, clip.end]` of its recording at `clip.timescale`.
//!
//! # Usage
//!
//! ```rust
//! use rk_timeline_eval::{ClipSegment, TimeMap};
//!
//! let clips = vec![ClipSegment::new(0.0, 5.0), ClipSegment::new(5.0, 8.0)];
//! let map = TimeMap::new(&clips);
//! let pos = map.timeline_to_source(6.0).unwrap();
//! assert_eq!(pos.segment_index, 1);
//! assert!((pos.source_time - 6.0).abs() < 1e-9);
//! ```

use rk_common::{RecordingRef, TIME_EPSILON};

use crate::types::ClipSegment;

/// Where a timeline instant lands in the source material.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SourcePosition {
    pub segment_index: usize,
    pub recording: RecordingRef,
    pub source_time: f64,
}

/// A source interval covered by part of a timeline window.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SourceWindow {
    pub segment_index: usize,
    pub source_start: f64,
    pub source_end: f64,
}

#[derive(Copy, Clone, Debug, PartialEq)]
struct MappedClip {
    start: f64,
    end: f64,
    timescale: f64,
    recording: RecordingRef,
}

/// Prefix-summed view of a clip track. Lookups are `O(log n)`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TimeMap {
    clips: Vec<MappedClip>,
    /// `starts[i]` is the timeline start of clip `i`; the last entry is the total.
    starts: Vec<f64>,
}

impl TimeMap {
    pub fn new(clips: &[ClipSegment]) -> Self {
        let mut starts = Vec::with_capacity(clips.len() + 1);
        let mut acc = 0.0;
        starts.push(acc);
        for clip in clips {
            acc += clip.duration();
            starts.push(acc);
        }

        Self {
            clips: clips
                .iter()
                .map(|c| MappedClip {
                    start: c.start,
                    end: c.end,
                    timescale: c.timescale,
                    recording: c.recording,
                })
                .collect(),
            starts,
        }
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn total_duration(&self) -> f64 {
        self.starts.last().copied().unwrap_or(0.0)
    }

    /// Timeline start of clip `index`.
    pub fn timeline_start(&self, index: usize) -> Option<f64> {
        if index < self.clips.len() {
            self.starts.get(index).copied()
        } else {
            None
        }
    }

    /// `(start, end)` of clip `index` on the timeline axis.
    pub fn timeline_range(&self, index: usize) -> Option<(f64, f64)> {
        if index < self.clips.len() {
            Some((self.starts[index], self.starts[index + 1]))
        } else {
            None
        }
    }

    /// Index of the clip playing at timeline time `t` (clamped to range).
    pub fn segment_at(&self, t: f64) -> Option<usize> {
        if self.clips.is_empty() {
            return None;
        }
        let total = self.total_duration();
        if t.is_nan() || t <= 0.0 {
            return Some(self.first_nonempty());
        }
        if t >= total {
            return Some(self.clips.len() - 1);
        }
        // Number of clip ends at or before t.
        let index = self.starts[1..].partition_point(|&end| end <= t);
        Some(index.min(self.clips.len() - 1))
    }

    fn first_nonempty(&self) -> usize {
        self.starts[1..]
            .iter()
            .position(|&end| end > 0.0)
            .unwrap_or(0)
    }

    /// Map timeline time to the owning clip and its source time.
    ///
    /// Times before zero clamp to the start; times at or past the end clamp
    /// to the final clip's `end`. Only an empty clip track yields `None`.
    pub fn timeline_to_source(&self, t: f64) -> Option<SourcePosition> {
        let index = self.segment_at(t)?;
        let clip = &self.clips[index];

        let source_time = if t >= self.total_duration() {
            clip.end
        } else {
            let local = (t - self.starts[index]).max(0.0);
            (clip.start + local * clip.timescale).min(clip.end)
        };

        Some(SourcePosition {
            segment_index: index,
            recording: clip.recording,
            source_time,
        })
    }

    /// Map a source time within clip `index` back onto the timeline.
    /// The source time is clamped into the clip's range.
    pub fn source_to_timeline(&self, index: usize, source_time: f64) -> Option<f64> {
        let clip = self.clips.get(index)?;
        let source = source_time.clamp(clip.start, clip.end);
        Some(self.starts[index] + (source - clip.start) / clip.timescale)
    }

    /// Map a source time onto the timeline through the first clip that
    /// contains it. `None` when that moment was cut out.
    pub fn source_to_timeline_any(&self, source_time: f64) -> Option<f64> {
        let index = self
            .clips
            .iter()
            .position(|c| source_time >= c.start && source_time < c.end)?;
        self.source_to_timeline(index, source_time)
    }

    /// Source intervals shown during the timeline window `[from, to]`,
    /// one per clip the window touches, in timeline order.
    pub fn source_windows(&self, from: f64, to: f64) -> Vec<SourceWindow> {
        let mut windows = Vec::new();
        if self.clips.is_empty() || to < from {
            return windows;
        }
        let total = self.total_duration();
        let from = from.clamp(0.0, total);
        let to = to.clamp(0.0, total);

        let (Some(first), Some(last)) = (self.segment_at(from), self.segment_at(to)) else {
            return windows;
        };

        for index in first..=last {
            let clip = &self.clips[index];
            let (seg_start, seg_end) = (self.starts[index], self.starts[index + 1]);
            let lo = from.max(seg_start);
            let hi = to.min(seg_end);
            if hi + TIME_EPSILON < lo {
                continue;
            }
            windows.push(SourceWindow {
                segment_index: index,
                source_start: clip.start + (lo - seg_start) * clip.timescale,
                source_end: (clip.start + (hi - seg_start) * clip.timescale).min(clip.end),
            });
        }
        windows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_clips() -> TimeMap {
        TimeMap::new(&[ClipSegment::new(0.0, 5.0), ClipSegment::new(5.0, 8.0)])
    }

    #[test]
    fn empty_track_maps_nothing() {
        let map = TimeMap::new(&[]);
        assert_eq!(map.total_duration(), 0.0);
        assert!(map.timeline_to_source(1.0).is_none());
        assert!(map.segment_at(0.0).is_none());
    }

    #[test]
    fn second_segment_lookup() {
        let pos = two_clips().timeline_to_source(6.0).unwrap();
        assert_eq!(pos.segment_index, 1);
        assert!((pos.source_time - 6.0).abs() < 1e-12);
    }

    #[test]
    fn boundary_belongs_to_next_segment() {
        let pos = two_clips().timeline_to_source(5.0).unwrap();
        assert_eq!(pos.segment_index, 1);
        assert!((pos.source_time - 5.0).abs() < 1e-12);
    }

    #[test]
    fn overshoot_clamps_to_final_end() {
        let pos = two_clips().timeline_to_source(8.0 + 1e-9).unwrap();
        assert_eq!(pos.segment_index, 1);
        assert_eq!(pos.source_time, 8.0);
    }

    #[test]
    fn negative_clamps_to_start() {
        let pos = two_clips().timeline_to_source(-2.0).unwrap();
        assert_eq!(pos.segment_index, 0);
        assert_eq!(pos.source_time, 0.0);
    }

    #[test]
    fn timescale_stretches_source() {
        let map = TimeMap::new(&[
            ClipSegment::new(0.0, 4.0),
            ClipSegment::new(10.0, 20.0).with_timescale(2.0),
        ]);
        assert_eq!(map.total_duration(), 9.0);
        let pos = map.timeline_to_source(6.0).unwrap();
        assert_eq!(pos.segment_index, 1);
        assert!((pos.source_time - 14.0).abs() < 1e-12);
        assert!((map.source_to_timeline(1, 14.0).unwrap() - 6.0).abs() < 1e-12);
    }

    #[test]
    fn source_to_timeline_clamps_into_segment() {
        let map = two_clips();
        assert_eq!(map.source_to_timeline(1, 100.0), Some(8.0));
        assert_eq!(map.source_to_timeline(2, 1.0), None);
    }

    #[test]
    fn cut_out_source_has_no_timeline_position() {
        let map = TimeMap::new(&[ClipSegment::new(0.0, 2.0), ClipSegment::new(4.0, 6.0)]);
        assert_eq!(map.source_to_timeline_any(3.0), None);
        assert_eq!(map.source_to_timeline_any(5.0), Some(3.0));
    }

    #[test]
    fn round_trip_across_segments() {
        let map = TimeMap::new(&[
            ClipSegment::new(1.0, 3.0),
            ClipSegment::new(7.0, 10.0).with_timescale(1.5),
            ClipSegment::new(0.0, 2.0).with_timescale(0.5),
        ]);
        let total = map.total_duration();
        let mut t = 0.0;
        while t < total {
            let pos = map.timeline_to_source(t).unwrap();
            let back = map.source_to_timeline(pos.segment_index, pos.source_time).unwrap();
            assert!((back - t).abs() < 1e-9, "t={t} back={back}");
            t += 0.07;
        }
    }

    #[test]
    fn source_windows_span_cut() {
        let map = TimeMap::new(&[ClipSegment::new(0.0, 2.0), ClipSegment::new(4.0, 6.0)]);
        let windows = map.source_windows(1.5, 2.5);
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].segment_index, 0);
        assert!((windows[0].source_start - 1.5).abs() < 1e-12);
        assert!((windows[0].source_end - 2.0).abs() < 1e-12);
        assert!((windows[1].source_start - 4.0).abs() < 1e-12);
        assert!((windows[1].source_end - 4.5).abs() < 1e-12);
    }

    #[test]
    fn timeline_ranges() {
        let map = two_clips();
        assert_eq!(map.timeline_range(1), Some((5.0, 8.0)));
        assert_eq!(map.timeline_start(0), Some(0.0));
        assert_eq!(map.timeline_start(2), None);
    }
}
