//! Project deserialization: loading `ProjectFile` from JSON files.

use std::path::Path;

use tracing::{debug, info, warn};

use rk_timeline_eval::{normalize_project, validate_timeline};

use crate::error::{ProjectError, ProjectResult};
use crate::migrate::migrate_project;
use crate::types::ProjectFile;

/// Deserialize a project from a JSON string.
///
/// Runs version migration, then repairs track ordering and overlaps so the
/// returned project satisfies the editor's invariants.
pub fn from_json_string(json: &str) -> ProjectResult<ProjectFile> {
    let mut value: serde_json::Value = serde_json::from_str(json)?;

    let version = migrate_project(&mut value)?;
    debug!(version, "Project version after migration");

    let mut file: ProjectFile = serde_json::from_value(value)?;

    if normalize_project(&mut file.project) {
        warn!(project_name = %file.name, "Loaded project needed repair");
    }
    validate_project(&file)?;

    debug!(
        project_name = %file.name,
        clips = file.project.timeline.clips.len(),
        duration = file.project.total_duration(),
        "Deserialized project from JSON"
    );
    Ok(file)
}

/// Load a project from a file at the given path.
pub fn load_project(path: &Path) -> ProjectResult<ProjectFile> {
    if !path.exists() {
        return Err(ProjectError::NotFound {
            path: path.display().to_string(),
        });
    }

    let json = std::fs::read_to_string(path).map_err(|e| {
        tracing::error!(path = %path.display(), error = %e, "Failed to read project file");
        ProjectError::Io(e)
    })?;

    let file = from_json_string(&json)?;

    info!(
        project_name = %file.name,
        path = %path.display(),
        "Project loaded successfully"
    );
    Ok(file)
}

fn validate_project(file: &ProjectFile) -> ProjectResult<()> {
    if file.name.trim().is_empty() {
        warn!("Project has empty name");
        return Err(ProjectError::InvalidProject {
            reason: "project name is empty".into(),
        });
    }
    validate_timeline(&file.project.timeline)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::save::{save_project, to_json_string};
    use rk_common::RecordingRef;
    use rk_timeline_eval::{OverlaySegment, TimelineEvalError, ZoomParams};

    fn sample_file() -> ProjectFile {
        let mut file = ProjectFile::for_recording("Load Test", RecordingRef(0), 10.0);
        file.project
            .timeline
            .zoom
            .push(OverlaySegment::new(1.0, 3.0, ZoomParams::default()));
        file
    }

    #[test]
    fn from_json_string_basic() {
        let json = to_json_string(&sample_file()).expect("serialize");
        let loaded = from_json_string(&json).expect("deserialize");
        assert_eq!(loaded, sample_file_with_times(&loaded));
    }

    fn sample_file_with_times(loaded: &ProjectFile) -> ProjectFile {
        let mut expected = sample_file();
        expected.created_at = loaded.created_at.clone();
        expected.updated_at = loaded.updated_at.clone();
        expected
    }

    #[test]
    fn load_project_file_roundtrip() {
        let dir = std::env::temp_dir().join("rk_project_load_test");
        let _ = std::fs::create_dir_all(&dir);
        let path = dir.join("load_test.rkp");

        save_project(&sample_file(), &path).expect("save");
        let loaded = load_project(&path).expect("load");
        assert_eq!(loaded.name, "Load Test");
        assert_eq!(loaded.project.timeline.zoom.len(), 1);

        let _ = std::fs::remove_file(&path);
        let _ = std::fs::remove_dir(&dir);
    }

    #[test]
    fn load_project_nonexistent_file() {
        let path = std::path::PathBuf::from("/nonexistent/path/project.rkp");
        let err = load_project(&path).unwrap_err();
        assert!(matches!(err, ProjectError::NotFound { .. }));
    }

    #[test]
    fn from_json_string_invalid_json() {
        assert!(matches!(
            from_json_string("this is not json"),
            Err(ProjectError::Json(_))
        ));
    }

    #[test]
    fn load_repairs_unsorted_overlapping_tracks() {
        let json = serde_json::json!({
            "version": 1,
            "name": "Messy",
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z",
            "project": {
                "timeline": {
                    "clips": [ { "start": 0.0, "end": 10.0 } ],
                    "zoom": [
                        { "start": 4.0, "end": 6.0, "params": { "amount": 2.0 } },
                        { "start": 0.0, "end": 5.0, "params": { "amount": 1.5 } }
                    ]
                }
            }
        });
        let loaded = from_json_string(&json.to_string()).expect("load");
        let zoom = &loaded.project.timeline.zoom;
        assert_eq!(zoom.len(), 2);
        assert_eq!((zoom[0].start, zoom[0].end), (0.0, 5.0));
        assert_eq!((zoom[1].start, zoom[1].end), (5.0, 6.0));
        assert!(zoom.iter().all(|s| s.enabled));
    }

    #[test]
    fn load_legacy_file() {
        let json = serde_json::json!({
            "name": "Legacy",
            "timeline": {
                "segments": [ { "start": 2.0, "end": 6.0, "timescale": 2.0 } ],
                "zoomSegments": [ { "start": 0.5, "end": 1.5, "amount": 2.5 } ]
            }
        });
        let loaded = from_json_string(&json.to_string()).expect("load");
        assert_eq!(loaded.project.total_duration(), 2.0);
        assert_eq!(loaded.project.timeline.zoom[0].params.amount, 2.5);
    }

    #[test]
    fn validate_rejects_empty_timeline() {
        let json = serde_json::json!({
            "version": 1,
            "name": "Empty",
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z",
            "project": { "timeline": { "clips": [] } }
        });
        let err = from_json_string(&json.to_string()).unwrap_err();
        assert!(matches!(
            err,
            ProjectError::Timeline(TimelineEvalError::EmptyTimeline)
        ));
    }

    #[test]
    fn validate_rejects_empty_name() {
        let mut file = sample_file();
        file.name = "  ".into();
        let json = to_json_string(&file).expect("serialize");
        let err = from_json_string(&json).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }
}
