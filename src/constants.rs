/// Constants used by the catalog client and descriptor extraction.
pub mod catalog {
    /// Default metastore endpoint listing every catalog item in one response.
    pub const DEFAULT_CATALOG_URL: &str =
        "https://data.cms.gov/provider-data/api/1/metastore/schemas/dataset/items";
    /// Default theme used to select datasets.
    pub const DEFAULT_CATEGORY: &str = "Hospitals";
    /// Media type of the only distribution format that is mirrored.
    pub const CSV_MEDIA_TYPE: &str = "text/csv";
    /// Title used when a catalog item carries none.
    pub const UNTITLED_PLACEHOLDER: &str = "untitled";
}

/// Constants used by sync-state persistence.
pub mod state {
    /// Default file name of the persisted sync state.
    pub const DEFAULT_STATE_FILENAME: &str = "run_metadata.json";
    /// Extension of the temporary file written before the state is renamed into place.
    pub const STATE_TEMP_EXTENSION: &str = "tmp";
}

/// Constants used by the sync orchestrator.
pub mod sync {
    /// Default cap on simultaneous dataset downloads.
    pub const DEFAULT_MAX_CONCURRENCY: usize = 5;
    /// Default per-request timeout, covering connect through the last body byte.
    pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
    /// Prefix used for worker-pool thread names.
    pub const WORKER_THREAD_PREFIX: &str = "catalog-sync-worker";
}

/// Constants used when writing mirrored datasets.
pub mod output {
    /// Default directory receiving mirrored datasets.
    pub const DEFAULT_OUTPUT_DIR: &str = "cms_hospital_data";
    /// Extension of mirrored dataset files.
    pub const CSV_EXTENSION: &str = "csv";
    /// Extension of in-progress dataset files before they are renamed into place.
    pub const PART_EXTENSION: &str = "part";
    /// Field delimiter of the mirrored tabular format.
    pub const FIELD_DELIMITER: char = ',';
    /// Quote character of the mirrored tabular format.
    pub const QUOTE: char = '"';
}
