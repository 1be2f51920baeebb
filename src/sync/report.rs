use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::{info, warn};
use uuid::Uuid;

use super::types::{Outcome, OutcomeStatus};
use crate::humanize::ByteCount;
use crate::manifest::FailureRecord;

/// In-memory aggregation of one run, rendered as the end-of-run
/// summary. The manifest, not this report, is the persisted record.
#[derive(Debug)]
pub struct SyncReport {
    pub run_id: Uuid,
    pub outcomes: Vec<Outcome>,
    /// Work items merged away before scheduling because another item
    /// already claimed their destination path
    pub duplicates_dropped: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl SyncReport {
    pub fn count(&self, status: OutcomeStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &Outcome> {
        self.outcomes.iter().filter(|o| o.is_error())
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    pub fn bytes_downloaded(&self) -> u64 {
        self.outcomes.iter().map(|o| o.bytes_written).sum()
    }

    pub fn category_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for outcome in self.outcomes.iter().filter(|o| !o.is_error()) {
            *counts.entry(outcome.item.category.as_str()).or_default() += 1;
        }
        counts
    }

    pub fn failure_records(&self) -> Vec<FailureRecord> {
        self.failures()
            .map(|outcome| FailureRecord {
                name: outcome.item.name.clone(),
                category: outcome.item.category.clone(),
                node_id: outcome.item.node_id.to_string(),
                error: outcome
                    .error
                    .clone()
                    .unwrap_or_else(|| "unknown error".to_string()),
            })
            .collect()
    }

    /// Structured end-of-run summary: counts per status and category,
    /// plus every failed item with its cause, so an operator can rerun
    /// to pick up only the missing items.
    pub fn log_summary(&self) {
        info!(
            run_id = %self.run_id,
            total = self.outcomes.len(),
            downloaded = self.count(OutcomeStatus::Downloaded),
            existing = self.count(OutcomeStatus::Exists),
            skipped = self.count(OutcomeStatus::Skipped),
            failed = self.count(OutcomeStatus::Error),
            duplicates_dropped = self.duplicates_dropped,
            bytes = %ByteCount(self.bytes_downloaded()),
            elapsed_ms = (self.finished_at - self.started_at).num_milliseconds(),
            "sync run finished"
        );

        for (category, count) in self.category_counts() {
            info!(category, count, "category synchronized");
        }

        for failure in self.failures() {
            warn!(
                name = %failure.item.name,
                category = %failure.item.category,
                node_id = %failure.item.node_id,
                error = failure.error.as_deref().unwrap_or("unknown error"),
                "item failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::WorkItem;

    fn report_with(outcomes: Vec<Outcome>) -> SyncReport {
        let now = Utc::now();
        SyncReport {
            run_id: Uuid::new_v4(),
            outcomes,
            duplicates_dropped: 0,
            started_at: now,
            finished_at: now,
        }
    }

    fn item(category: &str, name: &str) -> WorkItem {
        WorkItem::new("1:1".parse().unwrap(), name, category)
    }

    #[test]
    fn counts_by_status_and_category() {
        let report = report_with(vec![
            Outcome::downloaded(item("finance", "bank"), "finance/bank.svg".into(), 512),
            Outcome::exists(item("finance", "pix"), "finance/pix.svg".into()),
            Outcome::failed(
                item("social", "x"),
                "social/x.svg".into(),
                "no export produced".into(),
            ),
        ]);

        assert_eq!(report.count(OutcomeStatus::Downloaded), 1);
        assert_eq!(report.count(OutcomeStatus::Exists), 1);
        assert_eq!(report.count(OutcomeStatus::Error), 1);
        assert_eq!(report.bytes_downloaded(), 512);
        assert!(report.has_failures());

        let categories = report.category_counts();
        assert_eq!(categories.get("finance"), Some(&2));
        // failed items are not counted as synchronized
        assert_eq!(categories.get("social"), None);
    }

    #[test]
    fn failure_records_carry_cause() {
        let report = report_with(vec![Outcome::failed(
            item("finance", "bank"),
            "finance/bank.svg".into(),
            "HTTP 500: Internal Server Error".into(),
        )]);

        let records = report.failure_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "bank");
        assert_eq!(records[0].error, "HTTP 500: Internal Server Error");
    }
}
