use chrono::{DateTime, Utc};

use crate::data::FetchOutcome;
use crate::types::{DatasetId, FailureReason};

/// Aggregate result of one sync pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Datasets returned by the catalog for the configured category.
    pub listed: usize,
    /// Datasets downloaded and written this pass.
    pub updated: usize,
    /// Datasets whose stored marker already matched.
    pub skipped: usize,
    /// Failed datasets with their reasons, in catalog order.
    pub failures: Vec<(DatasetId, FailureReason)>,
    /// Completion time recorded in the persisted state.
    pub finished_at: Option<DateTime<Utc>>,
}

impl SyncReport {
    /// Number of failed datasets.
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// True when no dataset failed.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Count outcomes by kind.
pub fn summarize(outcomes: &[FetchOutcome]) -> SyncReport {
    let mut report = SyncReport {
        listed: outcomes.len(),
        ..SyncReport::default()
    };
    for outcome in outcomes {
        match outcome {
            FetchOutcome::Updated { .. } => report.updated += 1,
            FetchOutcome::Skipped { .. } => report.skipped += 1,
            FetchOutcome::Failed { dataset_id, reason } => {
                report.failures.push((dataset_id.clone(), reason.clone()));
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn summarize_counts_each_outcome_kind() {
        let outcomes = vec![
            FetchOutcome::Updated {
                dataset_id: "a".to_string(),
                version_marker: Some("v1".to_string()),
                path: PathBuf::from("a.csv"),
            },
            FetchOutcome::Skipped {
                dataset_id: "b".to_string(),
            },
            FetchOutcome::Skipped {
                dataset_id: "c".to_string(),
            },
            FetchOutcome::Failed {
                dataset_id: "d".to_string(),
                reason: "timeout".to_string(),
            },
        ];
        let report = summarize(&outcomes);
        assert_eq!(report.listed, 4);
        assert_eq!(report.updated, 1);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.failures[0], ("d".to_string(), "timeout".to_string()));
        assert!(!report.is_clean());
    }

    #[test]
    fn summarize_empty_pass_is_clean() {
        let report = summarize(&[]);
        assert_eq!(report, SyncReport::default());
        assert!(report.is_clean());
    }
}
