//! Persistence of the canonical result set.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::BufWriter;
use std::path::Path;

use serde::Serialize;

use crate::error::HarvestError;
use crate::models::{CanonicalRecord, SourceDb};

#[derive(Debug, Serialize)]
struct PersistedRecord<'a> {
    pmcid: Option<&'a str>,
    pmid: Option<&'a str>,
    sources: &'a BTreeSet<SourceDb>,
}

/// Write the canonical identifier set as a JSON map keyed by canonical id.
///
/// Written once, after all batches have joined; an aborted run leaves no
/// partial file behind. A persistence failure fails the run.
pub fn write_canonical_set(path: &Path, records: &[CanonicalRecord]) -> Result<(), HarvestError> {
    let map: BTreeMap<&str, PersistedRecord<'_>> = records
        .iter()
        .map(|record| {
            (
                record.canonical_id.as_str(),
                PersistedRecord {
                    pmcid: record.pmcid.as_deref(),
                    pmid: record.pmid.as_deref(),
                    sources: &record.sources,
                },
            )
        })
        .collect();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = fs::File::create(path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), &map)?;

    tracing::info!(records = records.len(), path = %path.display(), "wrote canonical set");
    Ok(())
}
