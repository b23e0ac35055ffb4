use std::path::PathBuf;
use std::time::Duration;

use crate::constants::catalog::{DEFAULT_CATALOG_URL, DEFAULT_CATEGORY};
use crate::constants::output::DEFAULT_OUTPUT_DIR;
use crate::constants::state::DEFAULT_STATE_FILENAME;
use crate::constants::sync::{DEFAULT_MAX_CONCURRENCY, DEFAULT_REQUEST_TIMEOUT_SECS};
use crate::errors::SyncError;
use crate::types::CategoryTag;

/// Static configuration for one catalog mirror.
#[derive(Clone, Debug)]
pub struct SyncConfig {
    /// Endpoint returning the full list of catalog items.
    pub catalog_url: String,
    /// Theme a catalog item must carry to be mirrored.
    pub category: CategoryTag,
    /// Cap on simultaneous dataset downloads.
    pub max_concurrency: usize,
    /// Directory receiving mirrored datasets.
    pub output_dir: PathBuf,
    /// Path of the persisted sync state.
    pub state_path: PathBuf,
    /// Upper bound on a single HTTP request, body included.
    pub request_timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            category: DEFAULT_CATEGORY.to_string(),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            state_path: PathBuf::from(DEFAULT_STATE_FILENAME),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl SyncConfig {
    /// Reject configurations that cannot drive a sync pass.
    pub fn validated(self) -> Result<Self, SyncError> {
        if self.max_concurrency == 0 {
            return Err(SyncError::Configuration(
                "max_concurrency must be greater than zero".to_string(),
            ));
        }
        if self.category.trim().is_empty() {
            return Err(SyncError::Configuration(
                "category must not be empty".to_string(),
            ));
        }
        if self.catalog_url.trim().is_empty() {
            return Err(SyncError::Configuration(
                "catalog_url must not be empty".to_string(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(SyncError::Configuration(
                "request_timeout must be greater than zero".to_string(),
            ));
        }
        Ok(self)
    }
}
