//! Cross-source identifier reconciliation.
//!
//! PMC-sourced records are keyed by PMCID and may cross-reference a PMID;
//! PubMed-sourced records the other way around. Two records describe the
//! same article when they share a PMID, share a PMCID, or one's
//! cross-reference matches the other's primary id — and the relation is
//! transitive. Merging runs union-find over normalized id keys, so the
//! cost stays near-linear in the record count instead of pairwise
//! quadratic.

use std::collections::{BTreeSet, HashMap};

use crate::models::{
    normalize_pmcid, CanonicalRecord, DedupStats, RecordIdentifier, SourceDb,
};

/// Union-find over identifier keys, with path halving and union by rank
struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    fn new() -> Self {
        Self {
            parent: Vec::new(),
            rank: Vec::new(),
        }
    }

    fn make_node(&mut self) -> usize {
        let id = self.parent.len();
        self.parent.push(id);
        self.rank.push(0);
        id
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a == root_b {
            return;
        }
        match self.rank[root_a].cmp(&self.rank[root_b]) {
            std::cmp::Ordering::Less => self.parent[root_a] = root_b,
            std::cmp::Ordering::Greater => self.parent[root_b] = root_a,
            std::cmp::Ordering::Equal => {
                self.parent[root_b] = root_a;
                self.rank[root_a] += 1;
            }
        }
    }
}

#[derive(Default)]
struct CanonicalDraft {
    pmid: Option<String>,
    pmcid: Option<String>,
    sources: BTreeSet<SourceDb>,
}

/// Normalized identity keys a record contributes to the merge graph
fn id_keys(record: &RecordIdentifier) -> Vec<String> {
    let mut keys = Vec::with_capacity(2);
    if let Some(pmid) = record.pmid() {
        keys.push(format!("pmid:{}", pmid));
    }
    if let Some(pmcid) = record.pmcid() {
        keys.push(format!("pmc:{}", normalize_pmcid(pmcid)));
    }
    keys
}

/// Merge the two source sequences into one canonical record set.
///
/// Every record keys at least one identifier, so every record lands in
/// exactly one merge group; a record sharing nothing with anyone becomes
/// its own canonical record. A PMID known only through a cross-reference
/// still keys (and names) its group. The output is sorted by canonical id
/// so runs are reproducible.
pub fn deduplicate(
    pmc: &[RecordIdentifier],
    pubmed: &[RecordIdentifier],
) -> (Vec<CanonicalRecord>, DedupStats) {
    let records: Vec<(SourceDb, &RecordIdentifier)> = pmc
        .iter()
        .map(|r| (SourceDb::Pmc, r))
        .chain(pubmed.iter().map(|r| (SourceDb::Pubmed, r)))
        .collect();

    let mut uf = UnionFind::new();
    let mut nodes: HashMap<String, usize> = HashMap::new();

    // first pass: one node per distinct key, keys of one record unioned
    for (_, record) in &records {
        let keys = id_keys(record);
        let mut first = None;
        for key in keys {
            let node = match nodes.get(&key) {
                Some(&node) => node,
                None => {
                    let node = uf.make_node();
                    nodes.insert(key, node);
                    node
                }
            };
            match first {
                None => first = Some(node),
                Some(anchor) => uf.union(anchor, node),
            }
        }
    }

    // second pass: group records by their root and merge identifier sets
    let mut groups: HashMap<usize, CanonicalDraft> = HashMap::new();
    for (source, record) in &records {
        let keys = id_keys(record);
        let root = uf.find(nodes[&keys[0]]);
        let draft = groups.entry(root).or_default();
        if let Some(pmid) = record.pmid() {
            draft.pmid.get_or_insert_with(|| pmid.to_string());
        }
        if let Some(pmcid) = record.pmcid() {
            draft.pmcid.get_or_insert_with(|| normalize_pmcid(pmcid));
        }
        draft.sources.insert(*source);
    }

    let mut canonical: Vec<CanonicalRecord> = groups
        .into_values()
        .map(|draft| {
            let canonical_id =
                CanonicalRecord::canonical_key(draft.pmid.as_deref(), draft.pmcid.as_deref())
                    .unwrap_or_default();
            CanonicalRecord {
                canonical_id,
                pmcid: draft.pmcid,
                pmid: draft.pmid,
                sources: draft.sources,
            }
        })
        .collect();
    canonical.sort_by(|a, b| a.canonical_id.cmp(&b.canonical_id));

    let stats = DedupStats {
        pmc_input: pmc.len(),
        pubmed_input: pubmed.len(),
        canonical: canonical.len(),
    };
    tracing::info!(
        pmc = stats.pmc_input,
        pubmed = stats.pubmed_input,
        canonical = stats.canonical,
        "reconciled cross-source records"
    );
    (canonical, stats)
}
