//! Persisted sync state: which catalog version of each dataset was last mirrored.
//!
//! The state is a cache. Losing it only forces a full re-download on the next
//! run; it is written once per completed pass and never per dataset.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::constants::state::STATE_TEMP_EXTENSION;
use crate::data::{DatasetDescriptor, FetchOutcome, version_marker_from_json};
use crate::errors::SyncError;
use crate::transport::fs::write_atomic;
use crate::types::{DatasetId, VersionMarker};

/// Last completed run plus the version marker last mirrored per dataset.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    /// Completion time of the last full pass, `None` before the first one.
    #[serde(default, with = "timestamp")]
    pub last_run: Option<DateTime<Utc>>,
    /// Marker observed when each dataset was last written successfully.
    #[serde(default, deserialize_with = "deserialize_markers")]
    pub datasets: BTreeMap<DatasetId, VersionMarker>,
}

impl SyncState {
    /// Marker stored for `id`, if that dataset was mirrored before.
    pub fn seen_version(&self, id: &str) -> Option<&str> {
        self.datasets.get(id).map(String::as_str)
    }

    /// True when the catalog marker equals the stored one.
    ///
    /// A descriptor without a marker is never current.
    pub fn is_current(&self, descriptor: &DatasetDescriptor) -> bool {
        match descriptor.version_marker.as_deref() {
            Some(marker) => self.seen_version(&descriptor.id) == Some(marker),
            None => false,
        }
    }

    /// Fold one outcome into the state. Only `Updated` changes anything.
    pub fn apply(&mut self, outcome: &FetchOutcome) {
        if let FetchOutcome::Updated {
            dataset_id,
            version_marker,
            ..
        } = outcome
        {
            match version_marker {
                Some(marker) => {
                    self.datasets.insert(dataset_id.clone(), marker.clone());
                }
                None => {
                    self.datasets.remove(dataset_id);
                }
            }
        }
    }

    /// Produce the state to persist after a pass finished at `finished_at`.
    pub fn merged<'a, I>(&self, outcomes: I, finished_at: DateTime<Utc>) -> SyncState
    where
        I: IntoIterator<Item = &'a FetchOutcome>,
    {
        let mut next = self.clone();
        for outcome in outcomes {
            next.apply(outcome);
        }
        next.last_run = Some(finished_at);
        next
    }
}

/// Backend that loads and persists [`SyncState`].
pub trait StateStore: Send + Sync {
    /// Load the prior state; `Ok(None)` means no state was ever persisted.
    fn load(&self) -> Result<Option<SyncState>, SyncError>;
    /// Replace the persisted state wholesale.
    fn persist(&self, state: &SyncState) -> Result<(), SyncError>;
}

impl<T: StateStore + ?Sized> StateStore for Arc<T> {
    fn load(&self) -> Result<Option<SyncState>, SyncError> {
        (**self).load()
    }

    fn persist(&self, state: &SyncState) -> Result<(), SyncError> {
        (**self).persist(state)
    }
}

/// JSON file store replaced atomically on every persist.
pub struct FileStateStore {
    path: PathBuf,
}

impl fmt::Debug for FileStateStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileStateStore")
            .field("path", &self.path)
            .finish()
    }
}

impl FileStateStore {
    /// Store backed by the JSON document at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the state document.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for FileStateStore {
    fn load(&self) -> Result<Option<SyncState>, SyncError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(SyncError::StateStore(format!(
                    "failed reading sync state {}: {err}",
                    self.path.display()
                )));
            }
        };
        let state = serde_json::from_str(&raw).map_err(|err| {
            SyncError::StateStore(format!(
                "failed parsing sync state {}: {err}",
                self.path.display()
            ))
        })?;
        Ok(Some(state))
    }

    fn persist(&self, state: &SyncState) -> Result<(), SyncError> {
        let raw = serde_json::to_vec_pretty(state).map_err(|err| {
            SyncError::StateStore(format!(
                "failed encoding sync state {}: {err}",
                self.path.display()
            ))
        })?;
        write_atomic(&self.path, &raw, STATE_TEMP_EXTENSION).map_err(|err| {
            SyncError::StateStore(format!(
                "failed replacing sync state {}: {err}",
                self.path.display()
            ))
        })
    }
}

/// In-process store for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    state: RwLock<Option<SyncState>>,
}

impl MemoryStateStore {
    /// Store seeded with `state`.
    pub fn with_state(state: SyncState) -> Self {
        Self {
            state: RwLock::new(Some(state)),
        }
    }

    /// Last persisted state, if any.
    pub fn snapshot(&self) -> Option<SyncState> {
        match self.state.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl StateStore for MemoryStateStore {
    fn load(&self) -> Result<Option<SyncState>, SyncError> {
        let guard = self
            .state
            .read()
            .map_err(|_| SyncError::StateStore("state lock poisoned".into()))?;
        Ok(guard.clone())
    }

    fn persist(&self, state: &SyncState) -> Result<(), SyncError> {
        let mut guard = self
            .state
            .write()
            .map_err(|_| SyncError::StateStore("state lock poisoned".into()))?;
        *guard = Some(state.clone());
        Ok(())
    }
}

/// Earlier deployments stored raw catalog values: `null` markers are dropped
/// and other non-string markers are kept as their JSON text.
fn deserialize_markers<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<DatasetId, VersionMarker>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<BTreeMap<DatasetId, Value>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(id, marker)| version_marker_from_json(marker).map(|marker| (id, marker)))
        .collect())
}

/// `last_run` is written as RFC 3339 UTC; timezone-less ISO-8601 is read as UTC.
mod timestamp {
    use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => {
                serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Micros, true))
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Some(raw) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };
        parse(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid last_run timestamp '{raw}'")))
    }

    pub(super) fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }
}
