//! End-to-end harvest pipeline.
//!
//! Wires the stages together: partition the term sets once, run every
//! partitioned query against both databases under the shared gate, then
//! reconcile the two identifier streams into the canonical record set.

use crate::config::HarvestConfig;
use crate::dedup;
use crate::error::HarvestError;
use crate::eutils::SearchBackend;
use crate::gate::RequestGate;
use crate::models::{CanonicalRecord, RecordIdentifier, RunReport, SourceDb};
use crate::orchestrator::{run_batches, Batch, BatchOutcome};
use crate::query::{self, DateRange};

/// Everything a harvest run produces
#[derive(Debug, Clone)]
pub struct HarvestOutcome {
    pub records: Vec<CanonicalRecord>,
    pub report: RunReport,
}

/// Harvest pipeline over a search backend
#[derive(Debug)]
pub struct Harvester<B> {
    backend: B,
    gate: RequestGate,
    config: HarvestConfig,
}

impl<B: SearchBackend> Harvester<B> {
    pub fn new(backend: B, gate: RequestGate, config: HarvestConfig) -> Self {
        Self {
            backend,
            gate,
            config,
        }
    }

    /// Partition the term sets and run the full pipeline.
    pub async fn run<F>(
        &self,
        devices: &[&str],
        indicators: &[&str],
        date: Option<&DateRange>,
        on_batch: F,
    ) -> Result<HarvestOutcome, HarvestError>
    where
        F: FnMut(&BatchOutcome),
    {
        let queries = query::partition(devices, indicators, date, self.config.query_ceiling)?;
        self.run_queries(&queries, on_batch).await
    }

    /// Run already-partitioned queries against both databases.
    ///
    /// Executes `queries.len() * 2` batches in total, one per query per
    /// database, sharing one worker pool and one request gate.
    pub async fn run_queries<F>(
        &self,
        queries: &[String],
        on_batch: F,
    ) -> Result<HarvestOutcome, HarvestError>
    where
        F: FnMut(&BatchOutcome),
    {
        let mut batches = Vec::with_capacity(queries.len() * 2);
        for db in [SourceDb::Pmc, SourceDb::Pubmed] {
            for (index, term) in queries.iter().enumerate() {
                batches.push(Batch::new(index, db, term.clone()));
            }
        }
        tracing::info!(
            queries = queries.len(),
            batches = batches.len(),
            workers = self.config.workers,
            rate = self.gate.rate(),
            "starting batched retrieval"
        );

        let (outcomes, mut report) = run_batches(
            &self.backend,
            &self.gate,
            batches,
            self.config.page_size,
            self.config.workers,
            self.config.retries,
            on_batch,
        )
        .await?;

        let mut pmc_ids: Vec<RecordIdentifier> = Vec::new();
        let mut pubmed_ids: Vec<RecordIdentifier> = Vec::new();
        for outcome in &outcomes {
            match outcome.db {
                SourceDb::Pmc => pmc_ids.extend(outcome.ids.iter().cloned()),
                SourceDb::Pubmed => pubmed_ids.extend(outcome.ids.iter().cloned()),
            }
        }

        let (records, stats) = dedup::deduplicate(&pmc_ids, &pubmed_ids);
        report.dedup = Some(stats);

        Ok(HarvestOutcome { records, report })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eutils::mock::{summary, MockBackend};
    use nonzero_ext::nonzero;

    fn make_harvester(backend: MockBackend) -> Harvester<MockBackend> {
        let config = HarvestConfig {
            workers: 1, // deterministic script consumption
            page_size: 10,
            ..HarvestConfig::default()
        };
        Harvester::new(backend, RequestGate::new(nonzero!(100u32)), config)
    }

    #[tokio::test]
    async fn test_pipeline_merges_both_databases() {
        let backend = MockBackend::new();
        // batches run PMC first, then PubMed
        backend.push_records(vec![
            summary("1", &[("pmid", "101")]),
            summary("2", &[("pmid", "0")]),
        ]);
        backend.push_records(vec![
            summary("101", &[("pmc", "PMC1")]),
            summary("303", &[]),
        ]);

        let queries = vec![r#"("d") AND ("i")"#.to_string()];
        let mut batches_seen = 0;
        let outcome = make_harvester(backend)
            .run_queries(&queries, |_| batches_seen += 1)
            .await
            .unwrap();

        assert_eq!(batches_seen, 2);

        // PMC1≡101 merge; PMC2 and 303 stand alone
        assert_eq!(outcome.records.len(), 3);
        let ids: Vec<&str> = outcome
            .records
            .iter()
            .map(|r| r.canonical_id.as_str())
            .collect();
        assert_eq!(ids, vec!["101", "303", "PMC2"]);

        let stats = outcome.report.dedup.unwrap();
        assert_eq!(stats.pmc_input, 2);
        assert_eq!(stats.pubmed_input, 2);
        assert_eq!(stats.canonical, 3);
    }

    #[tokio::test]
    async fn test_pipeline_partitions_before_fetching() {
        let backend = MockBackend::new();
        backend.push_records(vec![summary("1", &[])]);
        backend.push_records(vec![summary("201", &[])]);

        let outcome = make_harvester(backend)
            .run(
                &["Hemoblast"],
                &["prostatectomy"],
                Some(&DateRange::years(Some(2023), Some(2025))),
                |_| {},
            )
            .await
            .unwrap();

        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.report.total(), 2);
    }

    #[tokio::test]
    async fn test_pipeline_rejects_empty_terms_before_any_call() {
        let backend = MockBackend::new();
        let harvester = make_harvester(backend);

        let result = harvester.run(&[], &["prostatectomy"], None, |_| {}).await;
        assert!(matches!(result, Err(HarvestError::InvalidQuery(_))));
        assert_eq!(harvester.backend.search_calls(), 0);
    }
}
