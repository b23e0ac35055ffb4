//! Sync orchestrator: one full pass from state load to state persist.
//!
//! Lifecycle of a pass:
//! - load the prior [`SyncState`] (missing or unreadable state means empty),
//! - list descriptors from the [`Catalog`] (failure aborts the pass untouched),
//! - run one [`DatasetWorker`] job per descriptor on a pool capped at
//!   `max_concurrency` threads, all reading the same immutable snapshot,
//! - join every job, merge `Updated` outcomes, stamp `last_run`, and persist
//!   once.

use chrono::Utc;
use rayon::prelude::*;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{info, warn};

use crate::catalog::{Catalog, HttpCatalog};
use crate::config::SyncConfig;
use crate::constants::sync::WORKER_THREAD_PREFIX;
use crate::data::{DatasetDescriptor, FetchOutcome};
use crate::errors::SyncError;
use crate::metrics::{SyncReport, summarize};
use crate::state::{FileStateStore, StateStore, SyncState};
use crate::transport::{Fetcher, HttpFetcher};
use crate::worker::DatasetWorker;

/// Drives sync passes for one catalog and one output directory.
pub struct SyncOrchestrator {
    catalog: Box<dyn Catalog>,
    worker: DatasetWorker,
    store: Box<dyn StateStore>,
    max_concurrency: usize,
}

impl SyncOrchestrator {
    /// Assemble an orchestrator from explicit collaborators.
    pub fn new(
        catalog: Box<dyn Catalog>,
        worker: DatasetWorker,
        store: Box<dyn StateStore>,
        max_concurrency: usize,
    ) -> Result<Self, SyncError> {
        if max_concurrency == 0 {
            return Err(SyncError::Configuration(
                "max_concurrency must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            catalog,
            worker,
            store,
            max_concurrency,
        })
    }

    /// Wire the HTTP catalog, HTTP fetcher, and JSON state file from `config`.
    pub fn from_config(config: SyncConfig) -> Result<Self, SyncError> {
        let config = config.validated()?;
        let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(config.request_timeout));
        Self::from_config_with_fetcher(config, fetcher)
    }

    /// Same wiring as [`Self::from_config`] with a caller-supplied fetcher.
    pub fn from_config_with_fetcher(
        config: SyncConfig,
        fetcher: Arc<dyn Fetcher>,
    ) -> Result<Self, SyncError> {
        let config = config.validated()?;
        let catalog = HttpCatalog::new(&config.catalog_url, &config.category, fetcher.clone());
        let worker = DatasetWorker::new(fetcher, &config.output_dir);
        let store = FileStateStore::new(&config.state_path);
        Self::new(
            Box::new(catalog),
            worker,
            Box::new(store),
            config.max_concurrency,
        )
    }

    /// Run one full pass.
    ///
    /// Per-dataset failures are reported in the returned [`SyncReport`] and
    /// leave that dataset's stored marker unchanged. A catalog failure returns
    /// before any state is written; a state write failure is returned as an
    /// error rather than ignored.
    pub fn run_once(&self) -> Result<SyncReport, SyncError> {
        let prior = self.load_prior_state();
        let descriptors = self.catalog.list_datasets()?;
        info!(
            "[catalog_sync:sync] {} datasets listed; dispatching with concurrency {}",
            descriptors.len(),
            self.max_concurrency
        );

        let outcomes = self.dispatch(&descriptors, &prior)?;

        let finished_at = Utc::now();
        let next = prior.merged(&outcomes, finished_at);
        self.store.persist(&next)?;

        let mut report = summarize(&outcomes);
        report.finished_at = Some(finished_at);
        info!(
            listed = report.listed,
            updated = report.updated,
            skipped = report.skipped,
            failed = report.failed(),
            "[catalog_sync:sync] pass complete"
        );
        Ok(report)
    }

    fn load_prior_state(&self) -> SyncState {
        match self.store.load() {
            Ok(Some(state)) => state,
            Ok(None) => {
                info!("[catalog_sync:sync] no prior sync state; every dataset counts as changed");
                SyncState::default()
            }
            Err(err) => {
                warn!("[catalog_sync:sync] {err}; continuing with empty state");
                SyncState::default()
            }
        }
    }

    /// Run every worker job and block until all have reported.
    fn dispatch(
        &self,
        descriptors: &[DatasetDescriptor],
        prior: &SyncState,
    ) -> Result<Vec<FetchOutcome>, SyncError> {
        if descriptors.is_empty() {
            return Ok(Vec::new());
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_concurrency.min(descriptors.len()))
            .thread_name(|idx| format!("{WORKER_THREAD_PREFIX}-{idx}"))
            .build()
            .map_err(|err| {
                SyncError::Configuration(format!("failed building worker pool: {err}"))
            })?;

        let worker = &self.worker;
        let outcomes: Vec<FetchOutcome> = pool.install(|| {
            descriptors
                .par_iter()
                .map(|descriptor| process_contained(worker, descriptor, prior))
                .collect()
        });
        Ok(outcomes)
    }
}

/// A panicking job becomes a `Failed` outcome instead of tearing down the pass.
fn process_contained(
    worker: &DatasetWorker,
    descriptor: &DatasetDescriptor,
    prior: &SyncState,
) -> FetchOutcome {
    panic::catch_unwind(AssertUnwindSafe(|| worker.process(descriptor, prior))).unwrap_or_else(
        |_| {
            warn!(
                dataset_id = %descriptor.id,
                "[catalog_sync:sync] worker panicked"
            );
            FetchOutcome::Failed {
                dataset_id: descriptor.id.clone(),
                reason: "worker panicked".to_string(),
            }
        },
    )
}
