//! Text normalization helpers shared by the catalog client and the worker.

use crate::types::NormalizedName;

/// Apostrophe-like characters dropped before any other normalization step.
const APOSTROPHES: [char; 4] = ['\'', '\u{2018}', '\u{2019}', '`'];

/// Turn arbitrary header or title text into a `snake_case` identifier.
///
/// Apostrophes are removed outright. Any other run of characters outside ASCII
/// letters and digits separates words; the words are lowercased and joined
/// with `_`. Total and deterministic: `""` maps to `""`.
pub fn normalize_identifier(text: &str) -> NormalizedName {
    let mut normalized = String::with_capacity(text.len());
    let mut pending_separator = false;
    for ch in text.chars().filter(|ch| !APOSTROPHES.contains(ch)) {
        if ch.is_ascii_alphanumeric() {
            if pending_separator && !normalized.is_empty() {
                normalized.push('_');
            }
            pending_separator = false;
            normalized.push(ch.to_ascii_lowercase());
        } else {
            pending_separator = true;
        }
    }
    normalized
}
