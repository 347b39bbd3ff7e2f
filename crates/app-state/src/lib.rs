//! `rk-app-state` -- Editor session for the ReelKit timeline engine.
//!
//! This crate provides:
//!
//! - **`EditorSession`**: Single owner of an open project. All edits go through it.
//! - **`store`**: Clamped segment operations (insert, move, resize, split, delete).
//! - **`HistoryManager`**: Snapshot-based undo/redo with pause/resume for drags.
//! - **`SelectionState`**: Single- or multi-segment selection on one track.
//! - **`PlaybackState`**: Play/stop transport with wall-clock anchoring.
//! - **`Viewport`**: Visible timeline window (zoom and scroll).
//! - **`Player`**: Background ticker feeding composed frames to a renderer.
//!
//! # Architecture
//!
//! ```text
//! EditorSession
//! ├── file: ProjectFile              (project + envelope)
//! ├── map: TimeMap                   (rebuilt on clip changes)
//! ├── history: HistoryManager        (undo/redo snapshots)
//! ├── selection: SelectionState
//! ├── playback: PlaybackState
//! ├── viewport: Viewport
//! ├── drag: DragState                (Idle -> Pending -> Dragging)
//! └── saver: BackgroundSaver         (debounced auto-save thread)
//!
//! Player ── read lock ──> EditorSession::compose_frame ──> Renderer
//! ```

pub mod error;
pub mod history;
pub mod interaction;
pub mod playback;
pub mod player;
pub mod selection;
pub mod session;
pub mod snapshot;
pub mod store;
pub mod viewport;

// Re-export primary types at crate root for convenience.
pub use error::{SessionError, SessionResult};
pub use history::{HistoryEntry, HistoryManager};
pub use interaction::{DragContext, DragKind, DragOutcome, DragState, DragTarget};
pub use playback::{PlaybackMode, PlaybackState};
pub use player::Player;
pub use selection::{IndexShift, SelectionState};
pub use session::{EditorCommand, EditorSession, SharedSession};
pub use snapshot::EditorSnapshot;
pub use store::{Edge, EditLimits};
pub use viewport::Viewport;
