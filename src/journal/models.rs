use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// One journal entry, as stored in the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoRecord {
    pub id: String,
    /// Object store key of the image bytes, e.g. `photos/photo_1714557600123.jpg`
    pub file_path: String,
    pub title: String,
    /// ISO-8601 creation time, millisecond precision
    pub timestamp: String,
    /// Handle of the just-captured image. Only set on the record returned by
    /// `add_photo`; never written to the index.
    #[serde(default, skip_serializing)]
    pub web_path: Option<String>,
}

impl PhotoRecord {
    /// Format a creation time the way the index stores it (`2024-05-01T10:00:00.123Z`).
    pub fn format_timestamp(at: DateTime<Utc>) -> String {
        at.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

/// Outcome of a reconciliation pass over the object store.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Number of files found under the photos prefix
    pub scanned: usize,
    /// Orphaned files that were deleted
    pub removed: Vec<String>,
    /// Indexed records whose file is missing (reported, not removed)
    pub missing: Vec<String>,
}

/// Statistics from a purge operation
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct PurgeStats {
    pub photos: u64,
    pub files: u64,
}
