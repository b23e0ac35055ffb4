use serde_json::Value;
use std::path::PathBuf;

pub use crate::types::{DatasetId, DownloadUrl, FailureReason, VersionMarker};

/// Metadata describing one downloadable catalog dataset.
///
/// Built fresh from the catalog on every run; only `id` and `version_marker`
/// outlive the run, through [`crate::state::SyncState`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatasetDescriptor {
    /// Stable catalog identifier, unique within the catalog.
    pub id: DatasetId,
    /// Display name, used to derive the output file stem.
    pub title: String,
    /// Last-modified token reported by the catalog.
    ///
    /// `None` when the catalog reports neither a modified nor a created value;
    /// such a dataset never matches stored state and is fetched on every run.
    pub version_marker: Option<VersionMarker>,
    /// Location of the CSV payload.
    pub download_url: DownloadUrl,
}

/// Read a version marker from any JSON value.
///
/// Strings are kept verbatim; numbers, booleans, and nested values use their
/// compact JSON text. `null` means no marker.
pub fn version_marker_from_json(value: Value) -> Option<VersionMarker> {
    match value {
        Value::Null => None,
        Value::String(marker) => Some(marker),
        other => Some(other.to_string()),
    }
}

/// Result of one worker's attempt to sync a dataset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Stored marker matches the catalog; nothing was downloaded.
    Skipped { dataset_id: DatasetId },
    /// Payload was downloaded, normalized, and fully written.
    Updated {
        dataset_id: DatasetId,
        version_marker: Option<VersionMarker>,
        path: PathBuf,
    },
    /// Download or write failed; stored state for the id stays as it was.
    Failed {
        dataset_id: DatasetId,
        reason: FailureReason,
    },
}

impl FetchOutcome {
    /// Identifier of the dataset this outcome belongs to.
    pub fn dataset_id(&self) -> &str {
        match self {
            FetchOutcome::Skipped { dataset_id }
            | FetchOutcome::Updated { dataset_id, .. }
            | FetchOutcome::Failed { dataset_id, .. } => dataset_id,
        }
    }

    /// True for [`FetchOutcome::Updated`].
    pub fn is_updated(&self) -> bool {
        matches!(self, FetchOutcome::Updated { .. })
    }
}
