//! Error types for the harvest pipeline.

/// Errors that can occur while building queries or retrieving records.
///
/// Query construction errors ([`InvalidQuery`](HarvestError::InvalidQuery),
/// [`TermTooLong`](HarvestError::TermTooLong)) are fatal and surface before
/// any network call. Request-level failures are contained at batch
/// granularity by the orchestrator and only become fatal when every batch
/// of a run fails.
#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    /// The query cannot be built at all (e.g. an empty term set).
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// A single vocabulary term cannot fit a minimal query under the ceiling.
    ///
    /// Terms are the smallest unit of partitioning; a term that does not fit
    /// on its own cannot be split further.
    #[error("term {term:?} needs {encoded} encoded bytes, over the {ceiling}-byte query ceiling")]
    TermTooLong {
        term: String,
        encoded: usize,
        ceiling: usize,
    },

    /// A request URL came out longer than the configured maximum.
    ///
    /// The partitioner guarantees this cannot happen for well-formed input;
    /// hitting it indicates a caller bypassed the partitioner.
    #[error("request URL is {len} bytes, over the {max}-byte maximum")]
    UrlTooLong { len: usize, max: usize },

    /// Network or HTTP failure on a single outbound call.
    #[error("request failed: {0}")]
    Request(String),

    /// The API answered with something we could not interpret.
    #[error("unexpected response payload: {0}")]
    Parse(String),

    /// Every query batch of the run failed, leaving nothing to report.
    #[error("all {0} query batches failed")]
    AllBatchesFailed(usize),

    /// Result persistence failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for HarvestError {
    fn from(err: reqwest::Error) -> Self {
        HarvestError::Request(err.to_string())
    }
}

impl From<serde_json::Error> for HarvestError {
    fn from(err: serde_json::Error) -> Self {
        HarvestError::Parse(format!("JSON: {}", err))
    }
}
