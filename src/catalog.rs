//! Catalog client: lists the datasets worth mirroring.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::constants::catalog::{CSV_MEDIA_TYPE, UNTITLED_PLACEHOLDER};
use crate::data::{DatasetDescriptor, version_marker_from_json};
use crate::errors::SyncError;
use crate::transport::Fetcher;
use crate::types::{CategoryTag, DownloadUrl, VersionMarker};

/// Source of dataset descriptors for one sync pass.
pub trait Catalog: Send + Sync {
    /// List every downloadable dataset in the target category.
    ///
    /// Order follows the upstream listing.
    fn list_datasets(&self) -> Result<Vec<DatasetDescriptor>, SyncError>;
}

/// One entry of the catalog listing. Every field is optional upstream.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    /// Display title; replaced by a placeholder when absent.
    #[serde(default)]
    pub title: Option<String>,
    /// Stable identifier; items without one are not mirrored.
    #[serde(default)]
    pub unique_identifier: Option<String>,
    /// Theme tags matched exactly against the configured category.
    #[serde(default, deserialize_with = "null_as_default")]
    pub theme: Vec<String>,
    /// Available download formats.
    #[serde(default, deserialize_with = "null_as_default")]
    pub distribution: Vec<Distribution>,
    /// Preferred version marker; any JSON scalar is accepted.
    #[serde(default, deserialize_with = "marker_field")]
    pub modified: Option<VersionMarker>,
    /// Version marker used when `modified` is missing.
    #[serde(default, deserialize_with = "marker_field")]
    pub created: Option<VersionMarker>,
}

/// One download format offered by a catalog item.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Distribution {
    /// Declared media type, e.g. `text/csv`.
    #[serde(default, rename = "mediaType")]
    pub media_type: Option<String>,
    /// Direct payload location.
    #[serde(default, rename = "downloadURL")]
    pub download_url: Option<DownloadUrl>,
}

impl CatalogItem {
    /// True when the item carries `category` among its themes.
    pub fn has_theme(&self, category: &str) -> bool {
        self.theme.iter().any(|theme| theme == category)
    }

    /// Download URL of the first CSV distribution.
    ///
    /// Only the first CSV distribution is considered; if it lacks a URL the
    /// item is not downloadable.
    pub fn csv_download_url(&self) -> Option<&str> {
        self.distribution
            .iter()
            .find(|dist| dist.media_type.as_deref() == Some(CSV_MEDIA_TYPE))
            .and_then(|dist| dist.download_url.as_deref())
            .filter(|url| !url.trim().is_empty())
    }

    /// `modified`, falling back to `created`; blank values count as absent.
    pub fn version_marker(&self) -> Option<&str> {
        fn present(value: &Option<String>) -> Option<&str> {
            value.as_deref().filter(|marker| !marker.trim().is_empty())
        }
        present(&self.modified).or_else(|| present(&self.created))
    }

    /// Build a descriptor when the item is in `category` and downloadable as CSV.
    pub fn to_descriptor(&self, category: &str) -> Option<DatasetDescriptor> {
        if !self.has_theme(category) {
            return None;
        }
        let download_url = self.csv_download_url()?;
        let id = self
            .unique_identifier
            .as_deref()
            .filter(|id| !id.trim().is_empty())?;
        Some(DatasetDescriptor {
            id: id.to_string(),
            title: self
                .title
                .clone()
                .unwrap_or_else(|| UNTITLED_PLACEHOLDER.to_string()),
            version_marker: self.version_marker().map(str::to_string),
            download_url: download_url.to_string(),
        })
    }
}

/// Keep items in `category` with a CSV distribution; first occurrence of an id wins.
pub fn descriptors_from_items<I>(items: I, category: &str) -> Vec<DatasetDescriptor>
where
    I: IntoIterator<Item = CatalogItem>,
{
    let mut seen = HashSet::new();
    let mut descriptors = Vec::new();
    for item in items {
        let Some(descriptor) = item.to_descriptor(category) else {
            continue;
        };
        if !seen.insert(descriptor.id.clone()) {
            warn!(
                dataset_id = %descriptor.id,
                "[catalog_sync:catalog] duplicate catalog identifier; keeping first entry"
            );
            continue;
        }
        descriptors.push(descriptor);
    }
    descriptors
}

/// Decode a listing body into descriptors for `category`.
///
/// The body must be a JSON array. Entries that do not match the item schema
/// are skipped individually rather than failing the listing.
pub fn parse_catalog_response(
    endpoint: &str,
    body: &[u8],
    category: &str,
) -> Result<Vec<DatasetDescriptor>, SyncError> {
    let raw_items: Vec<Value> =
        serde_json::from_slice(body).map_err(|err| SyncError::CatalogUnavailable {
            endpoint: endpoint.to_string(),
            reason: format!("failed parsing catalog listing: {err}"),
        })?;
    let total = raw_items.len();
    let items = raw_items
        .into_iter()
        .enumerate()
        .filter_map(|(idx, raw)| match serde_json::from_value::<CatalogItem>(raw) {
            Ok(item) => Some(item),
            Err(err) => {
                warn!("[catalog_sync:catalog] skipping malformed catalog item #{idx}: {err}");
                None
            }
        });
    let descriptors = descriptors_from_items(items, category);
    debug!(
        listed = total,
        matched = descriptors.len(),
        category,
        "[catalog_sync:catalog] listing filtered"
    );
    Ok(descriptors)
}

/// Catalog listed with a single GET against the items endpoint.
pub struct HttpCatalog {
    endpoint: String,
    category: CategoryTag,
    fetcher: Arc<dyn Fetcher>,
}

impl HttpCatalog {
    /// Catalog at `endpoint`, filtered to `category`, fetched through `fetcher`.
    pub fn new(
        endpoint: impl Into<String>,
        category: impl Into<CategoryTag>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            category: category.into(),
            fetcher,
        }
    }
}

impl Catalog for HttpCatalog {
    fn list_datasets(&self) -> Result<Vec<DatasetDescriptor>, SyncError> {
        info!(
            "[catalog_sync:catalog] listing catalog {} for category '{}'",
            self.endpoint, self.category
        );
        let body = self
            .fetcher
            .fetch(&self.endpoint)
            .map_err(|err| SyncError::CatalogUnavailable {
                endpoint: self.endpoint.clone(),
                reason: err.to_string(),
            })?;
        parse_catalog_response(&self.endpoint, &body, &self.category)
    }
}

fn marker_field<'de, D>(deserializer: D) -> Result<Option<VersionMarker>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(version_marker_from_json))
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
