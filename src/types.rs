/// Stable catalog identifier of one dataset.
/// Example: `xubh-q36u`
pub type DatasetId = String;
/// Opaque change-detection token reported by the catalog, compared by equality only.
/// Examples: `2024-01-01`, `2023-11-30T08:12:44`
pub type VersionMarker = String;
/// Catalog theme used to select datasets.
/// Examples: `Hospitals`, `Nursing homes including rehab services`
pub type CategoryTag = String;
/// Location of a dataset's tabular payload.
/// Example: `https://data.cms.gov/provider-data/sites/default/files/resources/hospital_general.csv`
pub type DownloadUrl = String;
/// Canonical identifier produced by header normalization.
/// Examples: `hospitals_name`, `of_patients_2023`
pub type NormalizedName = String;
/// Human-readable failure reason attached to a failed outcome.
/// Example: `request to 'https://...' returned HTTP status 404`
pub type FailureReason = String;
