//! `rk-project` -- Project persistence for the ReelKit editor.
//!
//! This crate handles loading and saving editor projects as JSON:
//!
//! - **Save/Load**: Serialize/deserialize `ProjectFile` to/from JSON
//! - **Migration**: Upgrades legacy project layouts to the current format
//! - **Stores**: `FileStore` and `MemoryStore` behind the `ProjectStore` seam
//! - **Auto-Save**: Debounced dirty tracking plus a background writer thread
//!
//! # Usage
//!
//! ```rust,no_run
//! use rk_common::RecordingRef;
//! use rk_project::{load_project, save_project, ProjectFile};
//! use std::path::Path;
//!
//! let file = ProjectFile::for_recording("My Project", RecordingRef(0), 30.0);
//!
//! save_project(&file, Path::new("project.rkp")).unwrap();
//!
//! let loaded = load_project(Path::new("project.rkp")).unwrap();
//! assert_eq!(loaded.name, "My Project");
//! ```

pub mod autosave;
pub mod error;
pub mod load;
pub mod migrate;
pub mod save;
pub mod store;
pub mod types;

// Re-export primary API at crate root
pub use autosave::{AutoSaver, BackgroundSaver, DEFAULT_DEBOUNCE_SECS};
pub use error::{ProjectError, ProjectResult};
pub use load::{from_json_string, load_project};
pub use migrate::{migrate_project, CURRENT_VERSION};
pub use save::{save_project, to_json_string, write_atomic};
pub use store::{FileStore, MemoryStore};
pub use types::{current_iso_timestamp, ProjectFile, PROJECT_EXTENSION};
