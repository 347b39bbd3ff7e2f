//! Drag interaction state machine: `Idle -> Pending -> Dragging -> Idle`.
//!
//! A drag starts `Pending`. It only becomes `Dragging` once the pointer has
//! travelled past the click threshold; releasing while still pending is a
//! click. The [`DragContext`] is captured once at drag start and carries
//! everything later pointer moves need: the target, the pointer origin, the
//! pixel scale, the segment's initial bounds and, for clip edges, the source
//! limit. Neighbour bounds are not cached; each move re-reads them from the
//! store.

use rk_timeline_eval::TrackKind;

use crate::snapshot::EditorSnapshot;
use crate::store::Edge;

/// The segment a drag operates on.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct DragTarget {
    pub kind: TrackKind,
    pub index: usize,
}

impl DragTarget {
    pub fn new(kind: TrackKind, index: usize) -> Self {
        Self { kind, index }
    }
}

/// What a drag does to its target.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DragKind {
    /// Translate an overlay segment.
    Move,
    /// Drag one edge.
    Resize(Edge),
}

#[derive(Clone, Debug)]
pub struct DragContext {
    pub target: DragTarget,
    pub kind: DragKind,
    /// Pointer x at drag start, in pixels.
    pub origin_x: f64,
    pub seconds_per_pixel: f64,
    /// Segment `(start, end)` at drag start. Source seconds for clips,
    /// timeline seconds otherwise.
    pub initial: (f64, f64),
    /// Clip timescale at drag start; pointer deltas are scaled by it so clip
    /// edges follow the pointer on the timeline axis.
    pub timescale: f64,
    /// Available source material, for clip edges.
    pub max_source: f64,
    /// State restored by `cancel_drag`.
    pub before: EditorSnapshot,
}

impl DragContext {
    /// Pointer travel in seconds.
    pub fn delta_secs(&self, pointer_x: f64) -> f64 {
        (pointer_x - self.origin_x) * self.seconds_per_pixel
    }

    /// Whether the pointer has moved far enough to count as a drag.
    pub fn exceeds_threshold(&self, pointer_x: f64, threshold_px: f64) -> bool {
        (pointer_x - self.origin_x).abs() >= threshold_px
    }
}

#[derive(Clone, Debug, Default)]
pub enum DragState {
    #[default]
    Idle,
    Pending(DragContext),
    Dragging(DragContext),
}

impl DragState {
    pub fn is_idle(&self) -> bool {
        matches!(self, DragState::Idle)
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self, DragState::Dragging(_))
    }

    pub fn context(&self) -> Option<&DragContext> {
        match self {
            DragState::Idle => None,
            DragState::Pending(ctx) | DragState::Dragging(ctx) => Some(ctx),
        }
    }
}

/// How a drag ended.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum DragOutcome {
    /// The drag moved past the threshold; its edits form one undo entry.
    Committed,
    /// The pointer never left the threshold; treated as a click at `time`.
    Click { time: f64 },
    /// The drag was cancelled or there was no drag in progress.
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rk_common::RecordingRef;
    use rk_timeline_eval::Project;

    use crate::selection::SelectionState;

    fn context() -> DragContext {
        DragContext {
            target: DragTarget::new(TrackKind::Zoom, 0),
            kind: DragKind::Move,
            origin_x: 100.0,
            seconds_per_pixel: 0.05,
            initial: (1.0, 3.0),
            timescale: 1.0,
            max_source: f64::INFINITY,
            before: EditorSnapshot::new(
                Project::from_recording(RecordingRef(0), 10.0),
                SelectionState::new(),
            ),
        }
    }

    #[test]
    fn delta_and_threshold() {
        let ctx = context();
        assert!((ctx.delta_secs(140.0) - 2.0).abs() < 1e-12);
        assert!(!ctx.exceeds_threshold(101.0, 2.0));
        assert!(ctx.exceeds_threshold(97.0, 2.0));
    }

    #[test]
    fn state_accessors() {
        assert!(DragState::default().is_idle());
        assert!(DragState::default().context().is_none());
        let dragging = DragState::Dragging(context());
        assert!(dragging.is_dragging());
        assert_eq!(dragging.context().map(|c| c.initial), Some((1.0, 3.0)));
    }
}
