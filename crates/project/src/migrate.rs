//! Version migration: transforms older project JSON to the current format.
//!
//! Version 0 files predate the envelope. They keep the project fields at the
//! root, store the clip track under `timeline.segments`, name overlay tracks
//! `zoomSegments`, `maskSegments` and so on, and keep overlay parameters
//! flat on each segment instead of under `params`.

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error::{ProjectError, ProjectResult};

/// Current project format version.
pub const CURRENT_VERSION: u32 = 1;

/// Envelope keys that stay at the root when wrapping a v0 project.
const ENVELOPE_KEYS: [&str; 4] = ["version", "name", "createdAt", "updatedAt"];

/// v0 track names and their v1 replacements.
const TRACK_RENAMES: [(&str, &str); 8] = [
    ("segments", "clips"),
    ("zoomSegments", "zoom"),
    ("maskSegments", "masks"),
    ("textSegments", "texts"),
    ("blurSegments", "blurs"),
    ("perspectiveSegments", "perspectives"),
    ("captionSegments", "captions"),
    ("sceneSegments", "scenes"),
];

const OVERLAY_TRACKS: [&str; 7] = [
    "zoom",
    "masks",
    "texts",
    "blurs",
    "perspectives",
    "captions",
    "scenes",
];

/// Keys an overlay segment keeps outside `params`.
const SEGMENT_KEYS: [&str; 3] = ["start", "end", "enabled"];

/// Migrate a project JSON value to the current version in place.
///
/// Returns the version after migration. Already-current projects are left
/// untouched.
pub fn migrate_project(value: &mut Value) -> ProjectResult<u32> {
    let obj = value
        .as_object_mut()
        .ok_or_else(|| ProjectError::InvalidProject {
            reason: "project root must be a JSON object".into(),
        })?;

    let version = extract_version(obj)?;

    if version > CURRENT_VERSION {
        return Err(ProjectError::UnsupportedVersion {
            version: version.to_string(),
        });
    }

    if version == CURRENT_VERSION {
        debug!(version, "Project is at current version, no migration needed");
        return Ok(version);
    }

    let mut current = version;
    while current < CURRENT_VERSION {
        let next = current + 1;
        info!(from = current, to = next, "Migrating project");

        match current {
            0 => migrate_v0_to_v1(obj)?,
            other => {
                return Err(ProjectError::MigrationFailed {
                    from: other.to_string(),
                    to: (other + 1).to_string(),
                    reason: format!("no migration path from version {other}"),
                });
            }
        }

        current = next;
    }

    obj.insert("version".to_string(), Value::Number(CURRENT_VERSION.into()));

    info!(from = version, to = CURRENT_VERSION, "Project migration complete");
    Ok(CURRENT_VERSION)
}

fn extract_version(obj: &Map<String, Value>) -> ProjectResult<u32> {
    match obj.get("version") {
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| ProjectError::InvalidProject {
                reason: "version must be a non-negative integer".into(),
            }),
        Some(Value::String(s)) => s.parse::<u32>().map_err(|_| ProjectError::InvalidProject {
            reason: format!("cannot parse version string: {s}"),
        }),
        Some(_) => Err(ProjectError::InvalidProject {
            reason: "version field has unexpected type".into(),
        }),
        None => {
            warn!("Project has no version field, assuming version 0");
            Ok(0)
        }
    }
}

fn migrate_v0_to_v1(obj: &mut Map<String, Value>) -> ProjectResult<()> {
    if !obj.contains_key("project") {
        let keys: Vec<String> = obj
            .keys()
            .filter(|k| !ENVELOPE_KEYS.contains(&k.as_str()))
            .cloned()
            .collect();
        let body: Map<String, Value> = keys
            .into_iter()
            .filter_map(|k| obj.remove(&k).map(|v| (k, v)))
            .collect();
        obj.insert("project".to_string(), Value::Object(body));
    }

    let timeline = obj
        .get_mut("project")
        .and_then(Value::as_object_mut)
        .and_then(|project| project.get_mut("timeline"))
        .and_then(Value::as_object_mut)
        .ok_or_else(|| ProjectError::MigrationFailed {
            from: "0".into(),
            to: "1".into(),
            reason: "project has no timeline object".into(),
        })?;

    for (old, new) in TRACK_RENAMES {
        if timeline.contains_key(new) {
            continue;
        }
        if let Some(track) = timeline.remove(old) {
            debug!(from = old, to = new, "Renaming track");
            timeline.insert(new.to_string(), track);
        }
    }

    for name in OVERLAY_TRACKS {
        let Some(Value::Array(segments)) = timeline.get_mut(name) else {
            continue;
        };
        for segment in segments.iter_mut().filter_map(Value::as_object_mut) {
            nest_params(segment);
            segment.entry("enabled").or_insert(Value::Bool(true));
        }
    }

    ensure_string_field(obj, "name", "Untitled Project");
    ensure_string_field(obj, "createdAt", "1970-01-01T00:00:00Z");
    ensure_string_field(obj, "updatedAt", "1970-01-01T00:00:00Z");
    Ok(())
}

/// Move flat overlay parameters under a `params` object.
fn nest_params(segment: &mut Map<String, Value>) {
    if segment.contains_key("params") {
        return;
    }
    let keys: Vec<String> = segment
        .keys()
        .filter(|k| !SEGMENT_KEYS.contains(&k.as_str()))
        .cloned()
        .collect();
    let params: Map<String, Value> = keys
        .into_iter()
        .filter_map(|k| segment.remove(&k).map(|v| (k, v)))
        .collect();
    segment.insert("params".to_string(), Value::Object(params));
}

fn ensure_string_field(obj: &mut Map<String, Value>, key: &str, default: &str) {
    if !obj.contains_key(key) {
        obj.insert(key.to_string(), Value::String(default.to_string()));
    }
}
