//! Snapshot-based undo/redo history manager.
//!
//! - Undo/redo stacks of [`EditorSnapshot`]s taken *before* each change
//! - Ref-counted `pause()`/`resume()` so a multi-step interaction (a drag)
//!   commits as one entry
//! - Configurable maximum history depth
//!
//! # Usage
//!
//! ```ignore
//! let mut history = HistoryManager::new(100);
//!
//! // Before a user action, capture the current state
//! history.push("Insert zoom", EditorSnapshot::new(project.clone(), selection.clone()));
//!
//! // Undo: hand over where we are now so redo can get back here
//! if let Some(prev) = history.undo(current_snapshot) {
//!     project = prev.project;
//! }
//!
//! // Grouping (for drag operations)
//! history.pause("Drag zoom", before);
//! // ... many small edits, push() calls are suppressed ...
//! history.resume(&project);
//! ```

use std::collections::VecDeque;
use std::time::Instant;

use rk_timeline_eval::Project;

use crate::snapshot::EditorSnapshot;

/// A single entry in the undo/redo history.
#[derive(Clone, Debug)]
pub struct HistoryEntry {
    /// Human-readable label describing the action (e.g., "Split clip").
    pub label: String,
    pub snapshot: EditorSnapshot,
    pub timestamp: Instant,
}

impl HistoryEntry {
    fn new(label: &str, snapshot: EditorSnapshot) -> Self {
        Self {
            label: label.to_string(),
            snapshot,
            timestamp: Instant::now(),
        }
    }
}

/// Manages undo/redo history using project snapshots.
///
/// - Pushing a new entry clears the redo stack (new timeline branch)
/// - While paused, pushes are suppressed; the outermost `resume()` commits
///   the state captured by the outermost `pause()` if anything changed
/// - The oldest entries are dropped beyond `max_entries`
#[derive(Debug)]
pub struct HistoryManager {
    undo_stack: VecDeque<HistoryEntry>,
    redo_stack: Vec<HistoryEntry>,
    max_entries: usize,
    pause_depth: usize,
    /// Snapshot captured by the outermost `pause()`.
    pending: Option<HistoryEntry>,
}

impl HistoryManager {
    /// Create a new history manager with the given maximum number of undo entries.
    pub fn new(max_entries: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_entries,
            pause_depth: 0,
            pending: None,
        }
    }

    /// Record the state *before* an action.
    ///
    /// Clears the redo stack. Suppressed while paused.
    pub fn push(&mut self, label: &str, before: EditorSnapshot) {
        if self.is_paused() {
            tracing::debug!(label, "Push suppressed: history paused");
            return;
        }
        self.commit(HistoryEntry::new(label, before));
    }

    fn commit(&mut self, entry: HistoryEntry) {
        let label = entry.label.clone();
        self.redo_stack.clear();
        self.undo_stack.push_back(entry);
        self.trim();
        tracing::debug!(
            label = %label,
            undo_depth = self.undo_stack.len(),
            "History entry pushed"
        );
    }

    fn trim(&mut self) {
        while self.undo_stack.len() > self.max_entries {
            self.undo_stack.pop_front();
        }
    }

    /// Suspend snapshot creation. Nested calls are counted; only the
    /// outermost call's `before` snapshot is kept.
    pub fn pause(&mut self, label: &str, before: EditorSnapshot) {
        if self.pause_depth == 0 {
            self.pending = Some(HistoryEntry::new(label, before));
            tracing::debug!(label, "History paused");
        }
        self.pause_depth += 1;
    }

    /// Undo one `pause()`. The outermost resume pushes a single entry if
    /// `current` differs from the state captured at pause time. Returns
    /// `true` if an entry was pushed.
    pub fn resume(&mut self, current: &Project) -> bool {
        if self.pause_depth == 0 {
            tracing::warn!("resume called while history is not paused");
            return false;
        }
        self.pause_depth -= 1;
        if self.pause_depth > 0 {
            return false;
        }
        match self.pending.take() {
            Some(entry) if entry.snapshot.differs_from(current) => {
                self.commit(entry);
                true
            }
            _ => {
                tracing::debug!("History resumed with no net change");
                false
            }
        }
    }

    pub fn is_paused(&self) -> bool {
        self.pause_depth > 0
    }

    /// Drop an in-progress pause without committing anything.
    fn abandon_pause(&mut self) {
        if self.pause_depth > 0 {
            tracing::warn!(depth = self.pause_depth, "Abandoning paused history");
            self.pause_depth = 0;
            self.pending = None;
        }
    }

    /// Undo the last action.
    ///
    /// `current` is the state being left; it goes on the redo stack. Returns
    /// the snapshot to restore, or `None` if there is nothing to undo.
    pub fn undo(&mut self, current: EditorSnapshot) -> Option<EditorSnapshot> {
        self.abandon_pause();
        let entry = self.undo_stack.pop_back()?;
        tracing::debug!(
            label = %entry.label,
            undo_remaining = self.undo_stack.len(),
            "Undo"
        );
        self.redo_stack.push(HistoryEntry::new(&entry.label, current));
        Some(entry.snapshot)
    }

    /// Redo the last undone action. Mirror image of [`undo`](Self::undo).
    pub fn redo(&mut self, current: EditorSnapshot) -> Option<EditorSnapshot> {
        self.abandon_pause();
        let entry = self.redo_stack.pop()?;
        tracing::debug!(
            label = %entry.label,
            redo_remaining = self.redo_stack.len(),
            "Redo"
        );
        self.undo_stack.push_back(HistoryEntry::new(&entry.label, current));
        self.trim();
        Some(entry.snapshot)
    }

    /// Check if undo is available.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Get the label of the action that would be undone next.
    pub fn undo_label(&self) -> Option<&str> {
        self.undo_stack.back().map(|e| e.label.as_str())
    }

    /// Get the label of the action that would be redone next.
    pub fn redo_label(&self) -> Option<&str> {
        self.redo_stack.last().map(|e| e.label.as_str())
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    /// Clear all history (undo and redo stacks) and any pause.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.pause_depth = 0;
        self.pending = None;
        tracing::debug!("History cleared");
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Set the maximum number of undo entries. Trims the oldest entries if needed.
    pub fn set_max_entries(&mut self, max: usize) {
        self.max_entries = max;
        self.trim();
    }
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(100)
    }
}
