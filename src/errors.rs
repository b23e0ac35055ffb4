use std::io;

use thiserror::Error;

use crate::types::DatasetId;

/// Error type for catalog, dataset, state-store, and configuration failures.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("catalog '{endpoint}' is unavailable: {reason}")]
    CatalogUnavailable { endpoint: String, reason: String },
    #[error("dataset '{dataset_id}' could not be fetched: {reason}")]
    DatasetFetchFailed {
        dataset_id: DatasetId,
        reason: String,
    },
    #[error("dataset '{dataset_id}' returned a malformed payload: {reason}")]
    MalformedPayload {
        dataset_id: DatasetId,
        reason: String,
    },
    #[error("state store failure: {0}")]
    StateStore(String),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Failure reported by a [`crate::transport::Fetcher`] for a single request.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request to '{url}' failed: {reason}")]
    Request { url: String, reason: String },
    #[error("request to '{url}' returned HTTP status {status}")]
    Status { url: String, status: u16 },
    #[error("failed reading response body from '{url}': {reason}")]
    Body { url: String, reason: String },
}
