//! Scripted search backend for tests.
//!
//! Each queued [`ScriptedSearch`] answers one esearch call in FIFO order;
//! successful entries open a session whose summaries are then served in
//! windows by `esummary`, with optional failure injection at a given
//! offset. Call counters let tests assert how many requests a retrieval
//! actually issued.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::HarvestError;
use crate::eutils::{ArticleId, DocSummary, SearchBackend, SearchHandle};
use crate::models::SourceDb;

/// One scripted esearch outcome
#[derive(Debug, Clone)]
pub enum ScriptedSearch {
    /// The esearch call itself fails
    Fail,
    /// The esearch call opens a session over these records
    Records {
        summaries: Vec<DocSummary>,
        /// Count reported to the caller; defaults to `summaries.len()`
        reported: Option<usize>,
        /// Fail every esummary window starting at this offset
        fail_at_offset: Option<usize>,
    },
}

#[derive(Debug)]
struct Session {
    summaries: Vec<DocSummary>,
    fail_at_offset: Option<usize>,
}

/// In-memory [`SearchBackend`] double
#[derive(Debug, Default)]
pub struct MockBackend {
    script: Mutex<VecDeque<ScriptedSearch>>,
    sessions: Mutex<HashMap<String, Session>>,
    search_calls: AtomicUsize,
    page_calls: AtomicUsize,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a scripted esearch outcome
    pub fn push(&self, entry: ScriptedSearch) {
        self.script.lock().unwrap().push_back(entry);
    }

    /// Queue a successful search over `summaries`
    pub fn push_records(&self, summaries: Vec<DocSummary>) {
        self.push(ScriptedSearch::Records {
            summaries,
            reported: None,
            fail_at_offset: None,
        });
    }

    /// Queue a failing esearch
    pub fn push_failure(&self) {
        self.push(ScriptedSearch::Fail);
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn page_calls(&self) -> usize {
        self.page_calls.load(Ordering::SeqCst)
    }
}

/// Build a document summary from a uid and `(idtype, value)` pairs
pub fn summary(uid: &str, articleids: &[(&str, &str)]) -> DocSummary {
    DocSummary {
        uid: uid.to_string(),
        articleids: articleids
            .iter()
            .map(|(idtype, value)| ArticleId {
                idtype: idtype.to_string(),
                value: value.to_string(),
            })
            .collect(),
    }
}

#[async_trait]
impl SearchBackend for MockBackend {
    async fn esearch(&self, _db: SourceDb, _term: &str) -> Result<SearchHandle, HarvestError> {
        let call = self.search_calls.fetch_add(1, Ordering::SeqCst);

        let entry = self.script.lock().unwrap().pop_front().ok_or_else(|| {
            HarvestError::Request("mock search script exhausted".to_string())
        })?;

        match entry {
            ScriptedSearch::Fail => Err(HarvestError::Request(
                "scripted esearch failure".to_string(),
            )),
            ScriptedSearch::Records {
                summaries,
                reported,
                fail_at_offset,
            } => {
                let webenv = format!("webenv-{}", call);
                let count = reported.unwrap_or(summaries.len());
                self.sessions.lock().unwrap().insert(
                    webenv.clone(),
                    Session {
                        summaries,
                        fail_at_offset,
                    },
                );
                Ok(SearchHandle {
                    count,
                    webenv,
                    query_key: "1".to_string(),
                })
            }
        }
    }

    async fn esummary(
        &self,
        _db: SourceDb,
        handle: &SearchHandle,
        retstart: usize,
        retmax: usize,
    ) -> Result<Vec<DocSummary>, HarvestError> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);

        let sessions = self.sessions.lock().unwrap();
        let session = sessions.get(&handle.webenv).ok_or_else(|| {
            HarvestError::Request(format!("mock session not found: {}", handle.webenv))
        })?;

        if session.fail_at_offset == Some(retstart) {
            return Err(HarvestError::Request(format!(
                "scripted page failure at retstart={}",
                retstart
            )));
        }

        let start = retstart.min(session.summaries.len());
        let end = (retstart + retmax).min(session.summaries.len());
        Ok(session.summaries[start..end].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_serves_windows_and_counts_calls() {
        let backend = MockBackend::new();
        backend.push_records(vec![
            summary("1", &[]),
            summary("2", &[]),
            summary("3", &[]),
        ]);

        let handle = backend.esearch(SourceDb::Pmc, "q").await.unwrap();
        assert_eq!(handle.count, 3);

        let first = backend.esummary(SourceDb::Pmc, &handle, 0, 2).await.unwrap();
        let second = backend.esummary(SourceDb::Pmc, &handle, 2, 2).await.unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 1);
        assert_eq!(backend.search_calls(), 1);
        assert_eq!(backend.page_calls(), 2);
    }

    #[tokio::test]
    async fn test_mock_scripted_failures() {
        let backend = MockBackend::new();
        backend.push_failure();
        backend.push(ScriptedSearch::Records {
            summaries: vec![summary("1", &[]), summary("2", &[])],
            reported: None,
            fail_at_offset: Some(1),
        });

        assert!(backend.esearch(SourceDb::Pmc, "q").await.is_err());

        let handle = backend.esearch(SourceDb::Pmc, "q").await.unwrap();
        assert!(backend.esummary(SourceDb::Pmc, &handle, 0, 1).await.is_ok());
        assert!(backend.esummary(SourceDb::Pmc, &handle, 1, 1).await.is_err());
    }
}
