//! Concurrent execution of partitioned query batches.
//!
//! Batches run on a fixed-size worker pool. The pool is kept small on
//! purpose: every request still goes through the shared gate, so
//! concurrency beyond the quota only adds contention. A batch that fails
//! or comes back truncated is retried exactly once, whole; a second
//! failure is recorded as permanent and its identifiers are excluded from
//! the aggregate. The run itself only fails when every batch failed.

use futures_util::stream::{self, StreamExt};

use crate::error::HarvestError;
use crate::eutils::SearchBackend;
use crate::fetch::{fetch_query, QueryRetrieval};
use crate::gate::RequestGate;
use crate::models::{BatchReport, BatchStatus, RecordIdentifier, RunReport, SourceDb};

/// One partitioned query plus its position in the partition sequence
#[derive(Debug, Clone)]
pub struct Batch {
    pub index: usize,
    pub db: SourceDb,
    pub term: String,
}

impl Batch {
    pub fn new(index: usize, db: SourceDb, term: impl Into<String>) -> Self {
        Self {
            index,
            db,
            term: term.into(),
        }
    }
}

/// Terminal result of one batch, identifiers included
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub index: usize,
    pub db: SourceDb,
    pub status: BatchStatus,
    pub expected: usize,
    pub retrieved: usize,
    /// Whether the terminal result came from the retry pass
    pub recovered: bool,
    pub ids: Vec<RecordIdentifier>,
}

impl BatchOutcome {
    fn report_row(&self) -> BatchReport {
        BatchReport {
            index: self.index,
            db: self.db,
            status: self.status,
            expected: self.expected,
            retrieved: self.retrieved,
            recovered: self.recovered,
        }
    }
}

/// Execute `batches` with bounded concurrency and aggregate the outcomes.
///
/// `on_done` fires once per batch as it reaches a terminal state, in
/// completion order. The returned outcomes and report rows are sorted by
/// (database, index) — completion order is nondeterministic and the
/// aggregate is a set union, so a stable order costs nothing and keeps
/// output reproducible.
pub async fn run_batches<B, F>(
    backend: &B,
    gate: &RequestGate,
    batches: Vec<Batch>,
    window: usize,
    workers: usize,
    retries: u32,
    mut on_done: F,
) -> Result<(Vec<BatchOutcome>, RunReport), HarvestError>
where
    B: SearchBackend + ?Sized,
    F: FnMut(&BatchOutcome),
{
    let total = batches.len();
    let mut pending = stream::iter(
        batches
            .into_iter()
            .map(|batch| execute_batch(backend, gate, batch, window, retries)),
    )
    .buffer_unordered(workers.max(1));

    let mut outcomes = Vec::with_capacity(total);
    let mut report = RunReport::default();
    while let Some(outcome) = pending.next().await {
        report.record(outcome.report_row());
        on_done(&outcome);
        outcomes.push(outcome);
    }

    if report.all_failed() {
        return Err(HarvestError::AllBatchesFailed(total));
    }

    outcomes.sort_by_key(|o| (o.db, o.index));
    report.batches.sort_by_key(|r| (r.db, r.index));
    Ok((outcomes, report))
}

/// Run one batch through its attempt/retry state machine.
async fn execute_batch<B>(
    backend: &B,
    gate: &RequestGate,
    batch: Batch,
    window: usize,
    retries: u32,
) -> BatchOutcome
where
    B: SearchBackend + ?Sized,
{
    let attempts = retries + 1;
    let mut best: Option<QueryRetrieval> = None;

    for attempt in 1..=attempts {
        match fetch_query(backend, gate, batch.db, &batch.term, window).await {
            Ok(retrieval) if retrieval.exhausted => {
                if attempt > 1 {
                    tracing::info!(
                        index = batch.index,
                        db = batch.db.id(),
                        "batch recovered on retry"
                    );
                }
                return BatchOutcome {
                    index: batch.index,
                    db: batch.db,
                    status: BatchStatus::Succeeded,
                    expected: retrieval.expected,
                    retrieved: retrieval.retrieved,
                    recovered: attempt > 1,
                    ids: retrieval.ids,
                };
            }
            Ok(retrieval) => {
                tracing::warn!(
                    index = batch.index,
                    db = batch.db.id(),
                    attempt,
                    retrieved = retrieval.retrieved,
                    expected = retrieval.expected,
                    "batch attempt truncated"
                );
                // keep the attempt that got furthest
                if best
                    .as_ref()
                    .map_or(true, |b| retrieval.retrieved > b.retrieved)
                {
                    best = Some(retrieval);
                }
            }
            Err(err) => {
                tracing::warn!(
                    index = batch.index,
                    db = batch.db.id(),
                    attempt,
                    error = %err,
                    "batch attempt failed"
                );
            }
        }
    }

    match best {
        Some(retrieval) => BatchOutcome {
            index: batch.index,
            db: batch.db,
            status: BatchStatus::Partial,
            expected: retrieval.expected,
            retrieved: retrieval.retrieved,
            recovered: false,
            ids: retrieval.ids,
        },
        None => {
            tracing::error!(
                index = batch.index,
                db = batch.db.id(),
                "batch permanently failed, identifiers excluded"
            );
            BatchOutcome {
                index: batch.index,
                db: batch.db,
                status: BatchStatus::Failed,
                expected: 0,
                retrieved: 0,
                recovered: false,
                ids: Vec::new(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eutils::mock::{summary, MockBackend, ScriptedSearch};
    use nonzero_ext::nonzero;

    fn gate() -> RequestGate {
        RequestGate::new(nonzero!(100u32))
    }

    fn numbered(n: usize) -> Vec<crate::eutils::DocSummary> {
        (0..n).map(|i| summary(&format!("{}", i + 1), &[])).collect()
    }

    #[tokio::test]
    async fn test_failed_then_successful_attempt_recovers() {
        let backend = MockBackend::new();
        backend.push_failure();
        backend.push_records(numbered(2));

        let batches = vec![Batch::new(0, SourceDb::Pmc, "q")];
        let (outcomes, report) = run_batches(&backend, &gate(), batches, 10, 1, 1, |_| {})
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].status, BatchStatus::Succeeded);
        assert!(outcomes[0].recovered);
        assert_eq!(outcomes[0].ids.len(), 2);
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.recovered, 1);
        assert_eq!(backend.search_calls(), 2);
    }

    #[tokio::test]
    async fn test_second_failure_is_permanent_but_not_fatal() {
        let backend = MockBackend::new();
        // batch 0 fails both attempts, batch 1 succeeds
        backend.push_failure();
        backend.push_failure();
        backend.push_records(numbered(3));

        let batches = vec![
            Batch::new(0, SourceDb::Pmc, "q0"),
            Batch::new(1, SourceDb::Pmc, "q1"),
        ];
        let (outcomes, report) = run_batches(&backend, &gate(), batches, 10, 1, 1, |_| {})
            .await
            .unwrap();

        assert_eq!(outcomes[0].status, BatchStatus::Failed);
        assert!(outcomes[0].ids.is_empty());
        assert_eq!(outcomes[1].status, BatchStatus::Succeeded);
        assert_eq!(outcomes[1].ids.len(), 3);
        assert_eq!(report.failed, 1);
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.retrieved_total, 3);
    }

    #[tokio::test]
    async fn test_every_batch_failing_fails_the_run() {
        let backend = MockBackend::new();
        backend.push_failure();
        backend.push_failure();

        let batches = vec![Batch::new(0, SourceDb::Pmc, "q")];
        let result = run_batches(&backend, &gate(), batches, 10, 1, 1, |_| {}).await;
        assert!(matches!(result, Err(HarvestError::AllBatchesFailed(1))));
    }

    #[tokio::test]
    async fn test_truncated_batch_keeps_prefix_as_partial() {
        let backend = MockBackend::new();
        let truncated = ScriptedSearch::Records {
            summaries: numbered(6),
            reported: None,
            fail_at_offset: Some(4),
        };
        // both attempts truncate at the same offset
        backend.push(truncated.clone());
        backend.push(truncated);

        let batches = vec![Batch::new(0, SourceDb::Pubmed, "q")];
        let (outcomes, report) = run_batches(&backend, &gate(), batches, 2, 1, 1, |_| {})
            .await
            .unwrap();

        assert_eq!(outcomes[0].status, BatchStatus::Partial);
        assert_eq!(outcomes[0].retrieved, 4);
        assert_eq!(outcomes[0].expected, 6);
        assert_eq!(outcomes[0].ids.len(), 4);
        assert!(report.is_shortfall());
    }

    #[tokio::test]
    async fn test_outcomes_sorted_and_callback_fired_per_batch() {
        let backend = MockBackend::new();
        backend.push_records(numbered(1));
        backend.push_records(numbered(2));
        backend.push_records(numbered(3));

        let batches = vec![
            Batch::new(0, SourceDb::Pmc, "q0"),
            Batch::new(1, SourceDb::Pmc, "q1"),
            Batch::new(0, SourceDb::Pubmed, "q0"),
        ];

        let mut seen = 0;
        let (outcomes, report) =
            run_batches(&backend, &gate(), batches, 10, 1, 1, |_| seen += 1)
                .await
                .unwrap();

        assert_eq!(seen, 3);
        assert_eq!(report.total(), 3);
        let order: Vec<(SourceDb, usize)> = outcomes.iter().map(|o| (o.db, o.index)).collect();
        assert_eq!(
            order,
            vec![
                (SourceDb::Pmc, 0),
                (SourceDb::Pmc, 1),
                (SourceDb::Pubmed, 0)
            ]
        );
    }

    #[tokio::test]
    async fn test_bounded_concurrency_aggregates_everything() {
        let backend = MockBackend::new();
        for _ in 0..6 {
            backend.push_records(numbered(2));
        }

        let batches: Vec<Batch> = (0..6)
            .map(|i| Batch::new(i, SourceDb::Pmc, format!("q{}", i)))
            .collect();
        let (outcomes, report) = run_batches(&backend, &gate(), batches, 10, 2, 1, |_| {})
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 6);
        assert_eq!(report.succeeded, 6);
        assert_eq!(report.retrieved_total, 12);
    }
}
