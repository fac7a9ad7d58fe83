//! NCBI E-utilities transport.
//!
//! [`EntrezClient`] speaks the esearch/esummary JSON protocol over a shared
//! HTTP client. The [`SearchBackend`] trait is the seam between the
//! retrieval pipeline and the wire: production code runs against
//! [`EntrezClient`], tests against the scripted [`mock::MockBackend`].

mod client;
pub mod mock;

pub use client::{ArticleId, DocSummary, EntrezClient, SearchBackend, SearchHandle};
pub use mock::MockBackend;
