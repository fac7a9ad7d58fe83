//! # entrez-harvest
//!
//! Bulk retrieval of biomedical literature identifiers from the NCBI
//! E-utilities API. An arbitrarily large boolean query over two term
//! vocabularies is partitioned into URL-length-bounded batches, fetched
//! page by page under the shared request quota with bounded concurrency
//! and per-batch retry, and the records coming back from the PMC and
//! PubMed databases are reconciled into one canonical, de-duplicated set.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`query`]: boolean query construction and length-bounded partitioning
//! - [`gate`]: process-wide request throttle for the per-second quota
//! - [`eutils`]: E-utilities client and the transport seam for tests
//! - [`fetch`]: paginated retrieval of one query's full result set
//! - [`orchestrator`]: bounded-concurrency batch execution with retry
//! - [`dedup`]: cross-source identifier reconciliation
//! - [`harvest`]: the end-to-end pipeline tying the stages together
//! - [`models`]: record, report and statistics types
//! - [`terms`]: static search vocabularies
//! - [`config`]: configuration management
//! - [`output`]: canonical-set persistence

pub mod config;
pub mod dedup;
pub mod error;
pub mod eutils;
pub mod fetch;
pub mod gate;
pub mod harvest;
pub mod models;
pub mod orchestrator;
pub mod output;
pub mod query;
pub mod terms;

// Re-export commonly used types
pub use error::HarvestError;
pub use harvest::{HarvestOutcome, Harvester};
pub use models::{CanonicalRecord, RecordIdentifier, SourceDb};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
