//! Record identifier model shared by both E-utilities databases.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// The E-utilities database a record was retrieved from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceDb {
    Pmc,
    Pubmed,
}

impl SourceDb {
    /// Returns the `db` parameter value for E-utilities requests
    pub fn id(&self) -> &'static str {
        match self {
            SourceDb::Pmc => "pmc",
            SourceDb::Pubmed => "pubmed",
        }
    }

    /// Returns the display name of the database
    pub fn name(&self) -> &'static str {
        match self {
            SourceDb::Pmc => "PubMed Central",
            SourceDb::Pubmed => "PubMed",
        }
    }
}

impl std::fmt::Display for SourceDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One retrieved record, keyed by the scheme of the database it came from.
///
/// A PMC search keys records by PMCID and may carry a PMID cross-reference;
/// a PubMed search keys records by PMID and may carry a PMCID
/// cross-reference. Either cross-reference can be absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scheme", rename_all = "lowercase")]
pub enum RecordIdentifier {
    Pmc {
        pmcid: String,
        pmid: Option<String>,
    },
    Pubmed {
        pmid: String,
        pmcid: Option<String>,
    },
}

impl RecordIdentifier {
    /// PMCID carried by this record (primary or cross-reference)
    pub fn pmcid(&self) -> Option<&str> {
        match self {
            RecordIdentifier::Pmc { pmcid, .. } => Some(pmcid),
            RecordIdentifier::Pubmed { pmcid, .. } => pmcid.as_deref(),
        }
    }

    /// PMID carried by this record (primary or cross-reference)
    pub fn pmid(&self) -> Option<&str> {
        match self {
            RecordIdentifier::Pmc { pmid, .. } => pmid.as_deref(),
            RecordIdentifier::Pubmed { pmid, .. } => Some(pmid),
        }
    }
}

/// Normalize a PMC identifier to the `PMC`-prefixed form.
///
/// PMC esummary responses report bare numeric uids while cross-references
/// usually carry the prefix; both must key the same article.
pub fn normalize_pmcid(raw: &str) -> String {
    let raw = raw.trim();
    if raw.starts_with("PMC") {
        raw.to_string()
    } else {
        format!("PMC{}", raw)
    }
}

/// One real-world article after cross-source reconciliation.
///
/// The canonical id prefers the PubMed id when known, else the PMC id.
/// Identifier sets of distinct canonical records never intersect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    /// Normalized identity this record is keyed by
    pub canonical_id: String,

    /// PMC identifier, when any merged record carried one
    pub pmcid: Option<String>,

    /// PubMed identifier, when any merged record carried one
    pub pmid: Option<String>,

    /// Which database(s) reported this article
    pub sources: BTreeSet<SourceDb>,
}

impl CanonicalRecord {
    /// Pick the canonical key for a merged identifier set
    pub fn canonical_key(pmid: Option<&str>, pmcid: Option<&str>) -> Option<String> {
        pmid.or(pmcid).map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_db_ids() {
        assert_eq!(SourceDb::Pmc.id(), "pmc");
        assert_eq!(SourceDb::Pubmed.id(), "pubmed");
        assert_eq!(SourceDb::Pubmed.name(), "PubMed");
    }

    #[test]
    fn test_normalize_pmcid() {
        assert_eq!(normalize_pmcid("123456"), "PMC123456");
        assert_eq!(normalize_pmcid("PMC123456"), "PMC123456");
        assert_eq!(normalize_pmcid(" 123456 "), "PMC123456");
    }

    #[test]
    fn test_identifier_accessors() {
        let pmc = RecordIdentifier::Pmc {
            pmcid: "PMC1".to_string(),
            pmid: Some("101".to_string()),
        };
        assert_eq!(pmc.pmcid(), Some("PMC1"));
        assert_eq!(pmc.pmid(), Some("101"));

        let pubmed = RecordIdentifier::Pubmed {
            pmid: "202".to_string(),
            pmcid: None,
        };
        assert_eq!(pubmed.pmid(), Some("202"));
        assert_eq!(pubmed.pmcid(), None);
    }

    #[test]
    fn test_canonical_key_prefers_pmid() {
        assert_eq!(
            CanonicalRecord::canonical_key(Some("101"), Some("PMC1")),
            Some("101".to_string())
        );
        assert_eq!(
            CanonicalRecord::canonical_key(None, Some("PMC1")),
            Some("PMC1".to_string())
        );
        assert_eq!(CanonicalRecord::canonical_key(None, None), None);
    }
}
