//! Collaborators at the edge of the sync engine: the network and the filesystem.

use crate::errors::TransportError;

/// Atomic file writes used for mirrored datasets and persisted state.
pub mod fs;
/// Blocking HTTP fetcher backed by `ureq`.
pub mod http;

pub use http::HttpFetcher;

/// Retrieves the full body behind a URL.
///
/// The catalog client and every worker share one fetcher, so implementations
/// must be callable from many threads at once. A non-success status is an
/// error, never an empty body.
pub trait Fetcher: Send + Sync {
    /// Fetch the complete response body for `url`.
    fn fetch(&self, url: &str) -> Result<Vec<u8>, TransportError>;
}
