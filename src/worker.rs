use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::constants::output::{CSV_EXTENSION, PART_EXTENSION};
use crate::data::{DatasetDescriptor, FetchOutcome};
use crate::errors::SyncError;
use crate::payload::rewrite_header;
use crate::state::SyncState;
use crate::transport::Fetcher;
use crate::transport::fs::write_atomic;
use crate::utils::normalize_identifier;

/// Output file name for a dataset: `<normalized_title>_<id>.csv`.
pub fn target_file_name(descriptor: &DatasetDescriptor) -> String {
    format!(
        "{}_{}.{}",
        normalize_identifier(&descriptor.title),
        descriptor.id,
        CSV_EXTENSION
    )
}

/// Syncs one dataset at a time against a read-only state snapshot.
///
/// Workers never touch shared state; they report a [`FetchOutcome`] and the
/// orchestrator decides what to persist.
pub struct DatasetWorker {
    fetcher: Arc<dyn Fetcher>,
    output_dir: PathBuf,
}

impl DatasetWorker {
    /// Worker downloading through `fetcher` into `output_dir`.
    pub fn new(fetcher: Arc<dyn Fetcher>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            fetcher,
            output_dir: output_dir.into(),
        }
    }

    /// Directory receiving mirrored datasets.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Full output path for `descriptor`.
    ///
    /// Fails when the id could escape the output directory.
    pub fn output_path(&self, descriptor: &DatasetDescriptor) -> Result<PathBuf, SyncError> {
        if !is_plain_file_component(&descriptor.id) {
            return Err(SyncError::DatasetFetchFailed {
                dataset_id: descriptor.id.clone(),
                reason: "identifier is not usable as a file name".to_string(),
            });
        }
        Ok(self.output_dir.join(target_file_name(descriptor)))
    }

    /// Skip, refresh, or fail one dataset.
    pub fn process(&self, descriptor: &DatasetDescriptor, state: &SyncState) -> FetchOutcome {
        if state.is_current(descriptor) {
            debug!(
                dataset_id = %descriptor.id,
                "[catalog_sync:worker] no update for '{}'",
                descriptor.title
            );
            return FetchOutcome::Skipped {
                dataset_id: descriptor.id.clone(),
            };
        }

        match self.sync_dataset(descriptor) {
            Ok(path) => {
                info!(
                    dataset_id = %descriptor.id,
                    "[catalog_sync:worker] saved {}",
                    path.display()
                );
                FetchOutcome::Updated {
                    dataset_id: descriptor.id.clone(),
                    version_marker: descriptor.version_marker.clone(),
                    path,
                }
            }
            Err(err) => {
                warn!(
                    dataset_id = %descriptor.id,
                    "[catalog_sync:worker] failed syncing '{}': {err}",
                    descriptor.title
                );
                FetchOutcome::Failed {
                    dataset_id: descriptor.id.clone(),
                    reason: err.to_string(),
                }
            }
        }
    }

    fn sync_dataset(&self, descriptor: &DatasetDescriptor) -> Result<PathBuf, SyncError> {
        let path = self.output_path(descriptor)?;
        let payload = self
            .fetcher
            .fetch(&descriptor.download_url)
            .map_err(|err| SyncError::DatasetFetchFailed {
                dataset_id: descriptor.id.clone(),
                reason: err.to_string(),
            })?;
        let rewritten = rewrite_header(&payload).map_err(|err| SyncError::MalformedPayload {
            dataset_id: descriptor.id.clone(),
            reason: err.to_string(),
        })?;
        write_atomic(&path, &rewritten, PART_EXTENSION)?;
        Ok(path)
    }
}

fn is_plain_file_component(id: &str) -> bool {
    !id.is_empty()
        && id != "."
        && id != ".."
        && !id.contains(['/', '\\', '\0'])
}
