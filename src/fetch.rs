//! Paginated retrieval of one query's full result set.
//!
//! Pagination is inherently sequential: each window's existence depends on
//! the count the search reported and on how many records the previous
//! window actually returned. Parallelism lives one level up, across
//! batches, in the orchestrator.

use crate::error::HarvestError;
use crate::eutils::SearchBackend;
use crate::gate::RequestGate;
use crate::models::{RecordIdentifier, SourceDb};

/// Everything one query retrieval produced
#[derive(Debug, Clone)]
pub struct QueryRetrieval {
    /// Identifiers in retrieval order
    pub ids: Vec<RecordIdentifier>,

    /// Matches the API reported as available
    pub expected: usize,

    /// Identifiers actually retrieved
    pub retrieved: usize,

    /// True when pagination walked to exhaustion; false when a page
    /// failure truncated the walk
    pub exhausted: bool,
}

/// Retrieve every identifier matching `term` in `db`.
///
/// Issues one esearch for the total count, then walks `window`-sized
/// summary pages at strictly increasing offsets. Every call goes through
/// the gate. A page failure truncates the walk and returns the
/// accumulated prefix with `exhausted = false`; retrying is the
/// orchestrator's job, at batch granularity. An esearch failure is
/// returned as an error since nothing was retrieved yet.
pub async fn fetch_query<B>(
    backend: &B,
    gate: &RequestGate,
    db: SourceDb,
    term: &str,
    window: usize,
) -> Result<QueryRetrieval, HarvestError>
where
    B: SearchBackend + ?Sized,
{
    gate.acquire().await;
    let handle = backend.esearch(db, term).await?;
    let expected = handle.count;

    let mut ids: Vec<RecordIdentifier> = Vec::new();
    let mut exhausted = true;
    let mut retstart = 0;

    while retstart < expected {
        let retmax = window.min(expected - retstart);
        gate.acquire().await;
        match backend.esummary(db, &handle, retstart, retmax).await {
            Ok(page) => {
                let got = page.len();
                ids.extend(page.iter().map(|s| s.to_record(db)));
                if got < retmax {
                    // short window: the server has nothing more to give
                    break;
                }
                retstart += got;
            }
            Err(err) => {
                tracing::warn!(
                    db = db.id(),
                    retstart,
                    error = %err,
                    "page fetch failed, truncating query retrieval"
                );
                exhausted = false;
                break;
            }
        }
    }

    if exhausted && ids.len() < expected {
        tracing::debug!(
            db = db.id(),
            retrieved = ids.len(),
            expected,
            "result set exhausted before reported count"
        );
    }

    Ok(QueryRetrieval {
        retrieved: ids.len(),
        expected,
        exhausted,
        ids,
    })
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
    async fn test_walks_windows_until_count_reached() {
        let backend = MockBackend::new();
        backend.push_records(numbered(5));

        let result = fetch_query(&backend, &gate(), SourceDb::Pmc, "q", 2)
            .await
            .unwrap();

        // 5 records at window 2: windows of 2, 2 and 1
        assert_eq!(backend.page_calls(), 3);
        assert_eq!(result.expected, 5);
        assert_eq!(result.retrieved, 5);
        assert_eq!(result.ids.len(), 5);
        assert!(result.exhausted);
    }

    #[tokio::test]
    async fn test_short_window_ends_walk_cleanly() {
        let backend = MockBackend::new();
        // server claims 10 matches but only has 3 records
        backend.push(ScriptedSearch::Records {
            summaries: numbered(3),
            reported: Some(10),
            fail_at_offset: None,
        });

        let result = fetch_query(&backend, &gate(), SourceDb::Pmc, "q", 2)
            .await
            .unwrap();

        assert_eq!(result.expected, 10);
        assert_eq!(result.retrieved, 3);
        assert!(result.exhausted);
        assert_eq!(backend.page_calls(), 2);
    }

    #[tokio::test]
    async fn test_page_failure_truncates_with_prefix() {
        let backend = MockBackend::new();
        backend.push(ScriptedSearch::Records {
            summaries: numbered(6),
            reported: None,
            fail_at_offset: Some(4),
        });

        let result = fetch_query(&backend, &gate(), SourceDb::Pmc, "q", 2)
            .await
            .unwrap();

        assert_eq!(result.expected, 6);
        assert_eq!(result.retrieved, 4);
        assert!(!result.exhausted);
    }

    #[tokio::test]
    async fn test_search_failure_is_an_error() {
        let backend = MockBackend::new();
        backend.push_failure();

        let result = fetch_query(&backend, &gate(), SourceDb::Pmc, "q", 2).await;
        assert!(matches!(result, Err(HarvestError::Request(_))));
    }

    #[tokio::test]
    async fn test_zero_matches_skips_pagination() {
        let backend = MockBackend::new();
        backend.push_records(vec![]);

        let result = fetch_query(&backend, &gate(), SourceDb::Pubmed, "q", 2)
            .await
            .unwrap();

        assert_eq!(result.expected, 0);
        assert_eq!(result.retrieved, 0);
        assert!(result.exhausted);
        assert_eq!(backend.page_calls(), 0);
    }

    #[tokio::test]
    async fn test_records_carry_cross_references() {
        let backend = MockBackend::new();
        backend.push_records(vec![summary("123", &[("pmid", "456")])]);

        let result = fetch_query(&backend, &gate(), SourceDb::Pmc, "q", 10)
            .await
            .unwrap();

        assert_eq!(
            result.ids,
            vec![RecordIdentifier::Pmc {
                pmcid: "PMC123".to_string(),
                pmid: Some("456".to_string()),
            }]
        );
    }
}
