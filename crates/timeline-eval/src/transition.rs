//! Fade and ramp windows at segment boundaries.
//!
//! Segments fade in over `fade_in` seconds after their start and out over
//! `fade_out` seconds before their end. When the windows would overlap, the
//! segment duration is shared between them in proportion to their lengths
//! (evenly for equal fades). A boundary shared with an adjacent segment on
//! the same track does not fade at all.

use rk_common::TIME_EPSILON;

use crate::types::OverlaySegment;

/// Which boundaries of a segment touch a neighbour on the same track.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Adjacency {
    pub before: bool,
    pub after: bool,
}

/// Neighbour adjacency for `track[index]`.
///
/// A neighbour counts when it is enabled and the gap to it is below
/// `tolerance` (plus float slack). Relies on the track being sorted and
/// non-overlapping, so only the immediate neighbours are examined.
pub fn adjacency<P>(track: &[OverlaySegment<P>], index: usize, tolerance: f64) -> Adjacency {
    let Some(segment) = track.get(index) else {
        return Adjacency::default();
    };
    let tolerance = tolerance.max(0.0) + TIME_EPSILON;

    let before = index
        .checked_sub(1)
        .and_then(|i| track.get(i))
        .is_some_and(|prev| prev.enabled && segment.start - prev.end < tolerance);
    let after = track
        .get(index + 1)
        .is_some_and(|next| next.enabled && next.start - segment.end < tolerance);

    Adjacency { before, after }
}

/// Effective `(fade_in, fade_out)` windows for a segment of `duration`.
pub fn fade_windows(duration: f64, fade_in: f64, fade_out: f64) -> (f64, f64) {
    let fade_in = fade_in.max(0.0);
    let fade_out = fade_out.max(0.0);
    let total = fade_in + fade_out;

    if duration <= 0.0 {
        return (0.0, 0.0);
    }
    if total <= duration {
        return (fade_in, fade_out);
    }

    let scale = duration / total;
    (fade_in * scale, fade_out * scale)
}

/// Opacity multiplier in `0..=1` at `local` seconds into a segment.
pub fn fade_envelope(local: f64, duration: f64, fade_in: f64, fade_out: f64) -> f64 {
    let (fade_in, fade_out) = fade_windows(duration, fade_in, fade_out);
    let entering = compute_progress(local, 0.0, fade_in);
    let leaving = compute_progress(duration - local, 0.0, fade_out);
    entering * leaving
}

/// Fade envelope for `track[index]` at absolute `time`, skipping the fade on
/// boundaries shared with an adjacent segment.
pub fn segment_fade<P>(track: &[OverlaySegment<P>], index: usize, time: f64, fade: f64) -> f64 {
    let Some(segment) = track.get(index) else {
        return 0.0;
    };
    if fade <= 0.0 {
        return 1.0;
    }
    let adjacent = adjacency(track, index, fade);
    let fade_in = if adjacent.before { 0.0 } else { fade };
    let fade_out = if adjacent.after { 0.0 } else { fade };
    fade_envelope(time - segment.start, segment.duration(), fade_in, fade_out)
}

/// Linear progress in `0..=1` through a window starting at `start`.
///
/// A zero-length window counts as already complete.
pub fn compute_progress(time: f64, start: f64, duration: f64) -> f64 {
    if duration <= 0.0 {
        return 1.0;
    }
    ((time - start) / duration).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(start: f64, end: f64) -> OverlaySegment<()> {
        OverlaySegment::new(start, end, ())
    }

    #[test]
    fn windows_fit_unchanged() {
        assert_eq!(fade_windows(5.0, 0.5, 1.0), (0.5, 1.0));
    }

    #[test]
    fn short_segment_splits_evenly() {
        let (fi, fo) = fade_windows(1.0, 1.0, 1.0);
        assert!((fi - 0.5).abs() < 1e-12);
        assert!((fo - 0.5).abs() < 1e-12);
    }

    #[test]
    fn one_sided_fade_uses_whole_segment() {
        assert_eq!(fade_windows(0.5, 0.0, 1.0), (0.0, 0.5));
    }

    #[test]
    fn envelope_ramps_and_holds() {
        let d = 4.0;
        assert_eq!(fade_envelope(0.0, d, 1.0, 1.0), 0.0);
        assert!((fade_envelope(0.5, d, 1.0, 1.0) - 0.5).abs() < 1e-12);
        assert_eq!(fade_envelope(2.0, d, 1.0, 1.0), 1.0);
        assert!((fade_envelope(3.5, d, 1.0, 1.0) - 0.5).abs() < 1e-12);
        assert_eq!(fade_envelope(4.0, d, 1.0, 1.0), 0.0);
    }

    #[test]
    fn envelope_without_fades_is_one() {
        assert_eq!(fade_envelope(0.0, 2.0, 0.0, 0.0), 1.0);
        assert_eq!(fade_envelope(2.0, 2.0, 0.0, 0.0), 1.0);
    }

    #[test]
    fn short_segment_peaks_at_midpoint() {
        // duration 1.0 with 1.0s fades: windows become 0.5 each.
        assert!((fade_envelope(0.5, 1.0, 1.0, 1.0) - 1.0).abs() < 1e-12);
        assert!((fade_envelope(0.25, 1.0, 1.0, 1.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn adjacency_uses_immediate_neighbours() {
        let track = vec![seg(0.0, 2.0), seg(2.0, 4.0), seg(6.0, 8.0)];
        assert_eq!(
            adjacency(&track, 1, 0.5),
            Adjacency {
                before: true,
                after: false
            }
        );
        assert_eq!(
            adjacency(&track, 0, 0.5),
            Adjacency {
                before: false,
                after: true
            }
        );
        assert_eq!(adjacency(&track, 9, 0.5), Adjacency::default());
    }

    #[test]
    fn disabled_neighbour_is_not_adjacent() {
        let mut track = vec![seg(0.0, 2.0), seg(2.0, 4.0)];
        track[0].enabled = false;
        assert!(!adjacency(&track, 1, 0.5).before);
    }

    #[test]
    fn adjacent_boundary_does_not_fade() {
        let track = vec![seg(0.0, 2.0), seg(2.0, 4.0)];
        // At the shared boundary both sides stay fully visible.
        assert_eq!(segment_fade(&track, 1, 2.0, 0.5), 1.0);
        assert!((segment_fade(&track, 0, 1.999_999_9, 0.5) - 1.0).abs() < 1e-12);
        // Outer boundaries still fade.
        assert_eq!(segment_fade(&track, 0, 0.0, 0.5), 0.0);
        assert!((segment_fade(&track, 1, 3.75, 0.5) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn compute_progress_clamped() {
        assert_eq!(compute_progress(-1.0, 0.0, 2.0), 0.0);
        assert_eq!(compute_progress(1.0, 0.0, 2.0), 0.5);
        assert_eq!(compute_progress(5.0, 0.0, 2.0), 1.0);
        assert_eq!(compute_progress(0.0, 0.0, 0.0), 1.0);
    }
}
