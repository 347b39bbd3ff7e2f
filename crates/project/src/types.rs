//! On-disk project envelope.
//!
//! The editable state lives in [`Project`]; `ProjectFile` wraps it with a
//! format version, a display name and timestamps.

use serde::{Deserialize, Serialize};

use rk_common::RecordingRef;
use rk_timeline_eval::Project;

use crate::migrate::CURRENT_VERSION;

/// File extension used for saved projects.
pub const PROJECT_EXTENSION: &str = "rkp";

/// Top-level project file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFile {
    /// Project format version.
    pub version: u32,
    /// Human-readable project name.
    pub name: String,
    /// ISO 8601 creation timestamp.
    pub created_at: String,
    /// ISO 8601 last-modified timestamp.
    pub updated_at: String,
    pub project: Project,
}

impl ProjectFile {
    /// Wrap `project` in a fresh envelope stamped with the current time.
    pub fn new(name: impl Into<String>, project: Project) -> Self {
        let now = current_iso_timestamp();
        Self {
            version: CURRENT_VERSION,
            name: name.into(),
            created_at: now.clone(),
            updated_at: now,
            project,
        }
    }

    /// The default file for a fresh recording of `duration` seconds.
    pub fn for_recording(name: impl Into<String>, recording: RecordingRef, duration: f64) -> Self {
        Self::new(name, Project::from_recording(recording, duration))
    }

    /// Replace the project and bump `updated_at`.
    pub fn update(&mut self, project: Project) {
        self.project = project;
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = current_iso_timestamp();
    }
}

/// Current UTC time as `YYYY-MM-DDTHH:MM:SSZ`.
pub fn current_iso_timestamp() -> String {
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format_epoch(secs)
}

fn format_epoch(epoch: u64) -> String {
    let (year, month, day, hour, min, sec) = epoch_to_datetime(epoch);
    format!("{year:04}-{month:02}-{day:02}T{hour:02}:{min:02}:{sec:02}Z")
}

/// Convert Unix epoch seconds to (year, month, day, hour, minute, second).
fn epoch_to_datetime(epoch: u64) -> (u64, u64, u64, u64, u64, u64) {
    let sec = epoch % 60;
    let min = (epoch / 60) % 60;
    let hour = (epoch / 3600) % 24;
    let mut days = epoch / 86400;

    let mut year = 1970u64;
    loop {
        let days_in_year = if is_leap_year(year) { 366 } else { 365 };
        if days < days_in_year {
            break;
        }
        days -= days_in_year;
        year += 1;
    }

    let days_in_months: [u64; 12] = if is_leap_year(year) {
        [31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31]
    } else {
        [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31]
    };

    let mut month = 1u64;
    for &dm in &days_in_months {
        if days < dm {
            break;
        }
        days -= dm;
        month += 1;
    }

    (year, month, days + 1, hour, min, sec)
}

fn is_leap_year(year: u64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}
