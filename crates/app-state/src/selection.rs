//! Segment selection state.
//!
//! A selection is one track kind plus an ordered set of segment indices on
//! that track. It is transient (never persisted) and must be revalidated
//! after any edit that can shift or remove indices.

use std::collections::BTreeSet;

use rk_timeline_eval::{Timeline, TrackKind};
use serde::{Deserialize, Serialize};

/// How an edit moved segment positions on one track.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexShift {
    /// A segment now sits at `index`; later segments moved up by one.
    Inserted { kind: TrackKind, index: usize },
    /// The segment at `index` is gone; later segments moved down by one.
    Removed { kind: TrackKind, index: usize },
}

/// Which segments are currently selected.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionState {
    kind: Option<TrackKind>,
    indices: BTreeSet<usize>,
}

impl SelectionState {
    /// Create a new empty selection state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Select segment `index` on `kind`.
    ///
    /// Without `multi` the previous selection is replaced. Selecting on a
    /// different track always replaces it, since a selection spans one track.
    pub fn select(&mut self, kind: TrackKind, index: usize, multi: bool) {
        if !multi || self.kind != Some(kind) {
            self.indices.clear();
        }
        self.kind = Some(kind);
        self.indices.insert(index);
    }

    /// Add or remove `index` from the selection on `kind`.
    pub fn toggle(&mut self, kind: TrackKind, index: usize) {
        if self.kind != Some(kind) {
            self.select(kind, index, false);
            return;
        }
        if !self.indices.remove(&index) {
            self.indices.insert(index);
        }
        if self.indices.is_empty() {
            self.kind = None;
        }
    }

    pub fn deselect(&mut self, kind: TrackKind, index: usize) {
        if self.kind == Some(kind) {
            self.indices.remove(&index);
            if self.indices.is_empty() {
                self.kind = None;
            }
        }
    }

    pub fn clear(&mut self) {
        self.kind = None;
        self.indices.clear();
    }

    /// The selected track, if anything is selected.
    pub fn kind(&self) -> Option<TrackKind> {
        self.kind
    }

    /// Selected indices in ascending order.
    pub fn indices(&self) -> impl DoubleEndedIterator<Item = usize> + '_ {
        self.indices.iter().copied()
    }

    pub fn is_selected(&self, kind: TrackKind, index: usize) -> bool {
        self.kind == Some(kind) && self.indices.contains(&index)
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn count(&self) -> usize {
        self.indices.len()
    }

    /// Remap selected indices so they keep pointing at the same segments
    /// after `shift`. A removed segment leaves the selection.
    pub fn apply_shift(&mut self, shift: IndexShift) {
        let (kind, index, inserted) = match shift {
            IndexShift::Inserted { kind, index } => (kind, index, true),
            IndexShift::Removed { kind, index } => (kind, index, false),
        };
        if self.kind != Some(kind) {
            return;
        }
        self.indices = self
            .indices
            .iter()
            .filter_map(|&i| match (inserted, i.cmp(&index)) {
                (_, std::cmp::Ordering::Less) => Some(i),
                (true, _) => Some(i + 1),
                (false, std::cmp::Ordering::Equal) => None,
                (false, std::cmp::Ordering::Greater) => Some(i - 1),
            })
            .collect();
        if self.indices.is_empty() {
            self.kind = None;
        }
    }

    /// Drop indices that no longer exist on `timeline`. Returns `true` if the
    /// selection changed.
    pub fn revalidate(&mut self, timeline: &Timeline) -> bool {
        let Some(kind) = self.kind else {
            return false;
        };
        let len = timeline.track_len(kind);
        let before = self.indices.len();
        self.indices.retain(|&i| i < len);
        if self.indices.is_empty() {
            self.kind = None;
        }
        let changed = self.indices.len() != before;
        if changed {
            tracing::debug!(track = %kind, remaining = self.indices.len(), "Selection revalidated");
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rk_timeline_eval::{OverlaySegment, ZoomParams};

    #[test]
    fn new_selection_is_empty() {
        let sel = SelectionState::new();
        assert!(sel.is_empty());
        assert_eq!(sel.count(), 0);
        assert_eq!(sel.kind(), None);
    }

    #[test]
    fn select_single_replaces() {
        let mut sel = SelectionState::new();
        sel.select(TrackKind::Zoom, 1, false);
        sel.select(TrackKind::Zoom, 2, false);
        assert!(!sel.is_selected(TrackKind::Zoom, 1));
        assert!(sel.is_selected(TrackKind::Zoom, 2));
        assert_eq!(sel.count(), 1);
    }

    #[test]
    fn select_multi_accumulates_in_order() {
        let mut sel = SelectionState::new();
        sel.select(TrackKind::Mask, 3, false);
        sel.select(TrackKind::Mask, 0, true);
        sel.select(TrackKind::Mask, 3, true);
        assert_eq!(sel.indices().collect::<Vec<_>>(), vec![0, 3]);
    }

    #[test]
    fn selecting_other_track_replaces() {
        let mut sel = SelectionState::new();
        sel.select(TrackKind::Mask, 3, false);
        sel.select(TrackKind::Zoom, 0, true);
        assert_eq!(sel.kind(), Some(TrackKind::Zoom));
        assert_eq!(sel.count(), 1);
    }

    #[test]
    fn toggle_and_deselect() {
        let mut sel = SelectionState::new();
        sel.toggle(TrackKind::Text, 1);
        sel.toggle(TrackKind::Text, 2);
        sel.toggle(TrackKind::Text, 1);
        assert_eq!(sel.indices().collect::<Vec<_>>(), vec![2]);
        sel.deselect(TrackKind::Text, 2);
        assert!(sel.is_empty());
        assert_eq!(sel.kind(), None);
    }

    #[test]
    fn revalidate_drops_stale_indices() {
        let mut timeline = Timeline::default();
        timeline.zoom = vec![OverlaySegment::new(0.0, 1.0, ZoomParams::default())];
        let mut sel = SelectionState::new();
        sel.select(TrackKind::Zoom, 0, false);
        sel.select(TrackKind::Zoom, 4, true);

        assert!(sel.revalidate(&timeline));
        assert_eq!(sel.indices().collect::<Vec<_>>(), vec![0]);

        timeline.zoom.clear();
        assert!(sel.revalidate(&timeline));
        assert!(sel.is_empty());
        assert_eq!(sel.kind(), None);
    }

    #[test]
    fn insert_before_selection_moves_it_up() {
        let mut sel = SelectionState::new();
        sel.select(TrackKind::Zoom, 0, false);
        sel.select(TrackKind::Zoom, 2, true);
        sel.apply_shift(IndexShift::Inserted { kind: TrackKind::Zoom, index: 1 });
        assert_eq!(sel.indices().collect::<Vec<_>>(), vec![0, 3]);

        sel.apply_shift(IndexShift::Inserted { kind: TrackKind::Zoom, index: 0 });
        assert_eq!(sel.indices().collect::<Vec<_>>(), vec![1, 4]);
    }

    #[test]
    fn removal_drops_target_and_moves_later_down() {
        let mut sel = SelectionState::new();
        sel.select(TrackKind::Mask, 1, false);
        sel.select(TrackKind::Mask, 3, true);
        sel.apply_shift(IndexShift::Removed { kind: TrackKind::Mask, index: 1 });
        assert_eq!(sel.indices().collect::<Vec<_>>(), vec![2]);

        sel.apply_shift(IndexShift::Removed { kind: TrackKind::Mask, index: 2 });
        assert!(sel.is_empty());
        assert_eq!(sel.kind(), None);
    }

    #[test]
    fn shift_on_other_track_is_ignored() {
        let mut sel = SelectionState::new();
        sel.select(TrackKind::Text, 2, false);
        sel.apply_shift(IndexShift::Removed { kind: TrackKind::Zoom, index: 0 });
        sel.apply_shift(IndexShift::Inserted { kind: TrackKind::Clip, index: 0 });
        assert_eq!(sel.indices().collect::<Vec<_>>(), vec![2]);
    }
}
