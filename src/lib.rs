#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Command-line entry point used by the bundled binary.
pub mod app;
/// Catalog listing and descriptor extraction.
pub mod catalog;
/// Sync configuration types.
pub mod config;
/// Centralized constants used across the catalog client, worker, and state store.
pub mod constants;
/// Dataset descriptor and outcome types.
pub mod data;
/// Aggregate pass reporting.
pub mod metrics;
/// Header-record parsing and rewriting for delimited payloads.
pub mod payload;
/// Persisted sync state and its stores.
pub mod state;
/// Sync orchestrator driving a full pass.
pub mod sync;
/// Network and filesystem collaborators.
pub mod transport;
/// Shared type aliases.
pub mod types;
/// Text normalization helpers.
pub mod utils;
/// Per-dataset fetch-and-transform worker.
pub mod worker;

mod errors;

pub use catalog::{Catalog, CatalogItem, Distribution, HttpCatalog};
pub use config::SyncConfig;
pub use data::{DatasetDescriptor, FetchOutcome};
pub use errors::{SyncError, TransportError};
pub use metrics::SyncReport;
pub use state::{FileStateStore, MemoryStateStore, StateStore, SyncState};
pub use sync::SyncOrchestrator;
pub use transport::{Fetcher, HttpFetcher};
pub use types::{CategoryTag, DatasetId, DownloadUrl, FailureReason, NormalizedName, VersionMarker};
pub use utils::normalize_identifier;
pub use worker::{DatasetWorker, target_file_name};
