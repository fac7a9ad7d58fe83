//! Run-level accounting of what was requested vs. what was retrieved.

use serde::{Deserialize, Serialize};

use crate::models::SourceDb;

/// Terminal state of one query batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    /// Retrieval walked every result window to exhaustion
    Succeeded,
    /// Retrieval was truncated by a page failure; the retrieved prefix is kept
    Partial,
    /// No attempt produced any usable result; identifiers are excluded
    Failed,
}

/// Per-batch accounting row kept in the run report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    /// Position of the batch in the partition sequence
    pub index: usize,

    /// Database the batch ran against
    pub db: SourceDb,

    pub status: BatchStatus,

    /// Matches the API reported for the batch query
    pub expected: usize,

    /// Identifiers actually retrieved
    pub retrieved: usize,

    /// Whether the terminal result came from the retry pass
    pub recovered: bool,
}

/// Aggregated outcome of one harvest run.
///
/// A run never fails solely because some batches failed; this report is how
/// shortfalls are surfaced. `expected_total` counts what the API reported as
/// available, `retrieved_total` what actually arrived — a gap between them
/// is the partial-result warning.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunReport {
    pub batches: Vec<BatchReport>,

    pub succeeded: usize,
    pub partial: usize,
    pub failed: usize,

    /// Batches whose terminal result came from the retry pass
    pub recovered: usize,

    pub expected_total: usize,
    pub retrieved_total: usize,

    /// Filled in after cross-source reconciliation
    pub dedup: Option<DedupStats>,
}

impl RunReport {
    /// Record one terminal batch outcome
    pub fn record(&mut self, report: BatchReport) {
        match report.status {
            BatchStatus::Succeeded => self.succeeded += 1,
            BatchStatus::Partial => self.partial += 1,
            BatchStatus::Failed => self.failed += 1,
        }
        if report.recovered {
            self.recovered += 1;
        }
        self.expected_total += report.expected;
        self.retrieved_total += report.retrieved;
        self.batches.push(report);
    }

    /// Total number of batches executed
    pub fn total(&self) -> usize {
        self.batches.len()
    }

    /// Whether the run retrieved fewer records than the API reported
    pub fn is_shortfall(&self) -> bool {
        self.retrieved_total < self.expected_total
    }

    /// Whether every batch of the run failed
    pub fn all_failed(&self) -> bool {
        !self.batches.is_empty() && self.failed == self.batches.len()
    }
}

/// Input and output counts of the cross-source deduplication step
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DedupStats {
    /// Records coming in from the PMC search
    pub pmc_input: usize,

    /// Records coming in from the PubMed search
    pub pubmed_input: usize,

    /// Canonical records going out
    pub canonical: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(status: BatchStatus, expected: usize, retrieved: usize, recovered: bool) -> BatchReport {
        BatchReport {
            index: 0,
            db: SourceDb::Pmc,
            status,
            expected,
            retrieved,
            recovered,
        }
    }

    #[test]
    fn test_report_aggregates() {
        let mut report = RunReport::default();
        report.record(row(BatchStatus::Succeeded, 10, 10, false));
        report.record(row(BatchStatus::Partial, 100, 40, true));
        report.record(row(BatchStatus::Failed, 0, 0, false));

        assert_eq!(report.total(), 3);
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.partial, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.recovered, 1);
        assert_eq!(report.expected_total, 110);
        assert_eq!(report.retrieved_total, 50);
        assert!(report.is_shortfall());
        assert!(!report.all_failed());
    }

    #[test]
    fn test_all_failed() {
        let mut report = RunReport::default();
        assert!(!report.all_failed());

        report.record(row(BatchStatus::Failed, 0, 0, false));
        report.record(row(BatchStatus::Failed, 0, 0, true));
        assert!(report.all_failed());

        report.record(row(BatchStatus::Succeeded, 5, 5, false));
        assert!(!report.all_failed());
    }
}
