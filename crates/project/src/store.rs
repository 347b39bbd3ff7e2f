//! [`ProjectStore`] implementations: a file on disk and an in-memory log.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rk_common::{EngineResult, ProjectStore};
use tracing::debug;

use crate::save::write_atomic;

/// Stores snapshots in a single file, replaced atomically on every save.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProjectStore for FileStore {
    fn save(&self, serialized: &str) -> EngineResult<()> {
        write_atomic(&self.path, serialized.as_bytes())?;
        debug!(path = %self.path.display(), "Snapshot written");
        Ok(())
    }

    fn load(&self) -> EngineResult<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Keeps every saved snapshot in memory. Used by tests and previews.
#[derive(Debug, Default)]
pub struct MemoryStore {
    saves: Mutex<Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All snapshots saved so far, oldest first.
    pub fn saves(&self) -> Vec<String> {
        self.saves.lock().clone()
    }

    pub fn latest(&self) -> Option<String> {
        self.saves.lock().last().cloned()
    }
}

impl ProjectStore for MemoryStore {
    fn save(&self, serialized: &str) -> EngineResult<()> {
        self.saves.lock().push(serialized.to_string());
        Ok(())
    }

    fn load(&self) -> EngineResult<Option<String>> {
        Ok(self.latest())
    }
}
