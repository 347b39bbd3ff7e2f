//! Undo snapshots.
//!
//! An `EditorSnapshot` is an owned deep copy of everything an undo step
//! restores: the project and the selection that went with it. Playback,
//! viewport and drag state are view state and are not captured.

use rk_timeline_eval::Project;
use serde::{Deserialize, Serialize};

use crate::selection::SelectionState;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EditorSnapshot {
    pub project: Project,
    pub selection: SelectionState,
}

impl EditorSnapshot {
    pub fn new(project: Project, selection: SelectionState) -> Self {
        Self { project, selection }
    }

    /// Whether restoring this snapshot would change `project`.
    pub fn differs_from(&self, project: &Project) -> bool {
        self.project != *project
    }
}
