//! Project serialization: writing `ProjectFile` to JSON files.

use std::path::Path;

use tracing::{debug, info};

use crate::error::{ProjectError, ProjectResult};
use crate::types::ProjectFile;

/// Serialize a project to a pretty-printed JSON string.
pub fn to_json_string(file: &ProjectFile) -> ProjectResult<String> {
    let json = serde_json::to_string_pretty(file)?;
    debug!(
        project_name = %file.name,
        json_len = json.len(),
        "Serialized project to JSON"
    );
    Ok(json)
}

/// Save a project to a file at the given path, atomically.
pub fn save_project(file: &ProjectFile, path: &Path) -> ProjectResult<()> {
    let json = to_json_string(file)?;
    write_atomic(path, json.as_bytes())?;
    info!(
        project_name = %file.name,
        path = %path.display(),
        "Project saved successfully"
    );
    Ok(())
}

/// Write `bytes` to `path` via a temporary sibling file and a rename, so a
/// crash mid-write never leaves a truncated project behind.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> ProjectResult<()> {
    let temp_path = path.with_extension("tmp");

    std::fs::write(&temp_path, bytes).map_err(|e| {
        tracing::error!(path = %temp_path.display(), error = %e, "Failed to write temp file");
        ProjectError::Io(e)
    })?;

    std::fs::rename(&temp_path, path).map_err(|e| {
        let _ = std::fs::remove_file(&temp_path);
        tracing::error!(
            from = %temp_path.display(),
            to = %path.display(),
            error = %e,
            "Failed to rename temp file to target"
        );
        ProjectError::Io(e)
    })?;
    Ok(())
}
