//! E-utilities API client using the esearch/esummary JSON protocol.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::HarvestConfig;
use crate::error::HarvestError;
use crate::models::{normalize_pmcid, RecordIdentifier, SourceDb};

/// Count and history handles returned by one esearch call.
///
/// The history session (WebEnv + query key) is what the paginated summary
/// windows are read from; the ids in the esearch payload itself are unused.
#[derive(Debug, Clone)]
pub struct SearchHandle {
    pub count: usize,
    pub webenv: String,
    pub query_key: String,
}

/// One document summary: uid plus its cross-reference id list
#[derive(Debug, Clone, Deserialize)]
pub struct DocSummary {
    pub uid: String,
    #[serde(default)]
    pub articleids: Vec<ArticleId>,
}

/// One entry of a summary's `articleids` list
#[derive(Debug, Clone, Deserialize)]
pub struct ArticleId {
    pub idtype: String,
    pub value: String,
}

impl DocSummary {
    /// Interpret this summary as a record identifier in `db`'s scheme.
    ///
    /// PMC uids are bare numbers and get the `PMC` prefix; a pmid
    /// cross-reference of `"0"` means the article has none.
    pub fn to_record(&self, db: SourceDb) -> RecordIdentifier {
        match db {
            SourceDb::Pmc => {
                let pmid = self
                    .articleids
                    .iter()
                    .find(|id| id.idtype == "pmid" && id.value != "0" && !id.value.is_empty())
                    .map(|id| id.value.clone());
                RecordIdentifier::Pmc {
                    pmcid: normalize_pmcid(&self.uid),
                    pmid,
                }
            }
            SourceDb::Pubmed => {
                let pmcid = self
                    .articleids
                    .iter()
                    .find(|id| id.idtype == "pmc" && id.value != "0" && !id.value.is_empty())
                    .map(|id| normalize_pmcid(&id.value));
                RecordIdentifier::Pubmed {
                    pmid: self.uid.clone(),
                    pmcid,
                }
            }
        }
    }
}

/// Transport seam between the retrieval pipeline and the search API
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Count matches for `term` and open a history session over them
    async fn esearch(&self, db: SourceDb, term: &str) -> Result<SearchHandle, HarvestError>;

    /// Retrieve one result window from an open history session
    async fn esummary(
        &self,
        db: SourceDb,
        handle: &SearchHandle,
        retstart: usize,
        retmax: usize,
    ) -> Result<Vec<DocSummary>, HarvestError>;
}

/// HTTP client for the NCBI E-utilities endpoints
#[derive(Debug, Clone)]
pub struct EntrezClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    max_url_len: usize,
}

impl EntrezClient {
    pub fn new(config: &HarvestConfig) -> Result<Self, HarvestError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            max_url_len: config.max_url_len,
        })
    }

    /// Build a GET URL for `endpoint`, appending the API key when configured.
    ///
    /// The length guard backs the partitioner's ceiling: tripping it means a
    /// query reached the client without going through the partitioner.
    fn request_url(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<String, HarvestError> {
        let mut query: Vec<String> = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect();
        if let Some(key) = &self.api_key {
            query.push(format!("api_key={}", urlencoding::encode(key)));
        }

        let url = format!("{}/{}?{}", self.base_url, endpoint, query.join("&"));
        if url.len() > self.max_url_len {
            return Err(HarvestError::UrlTooLong {
                len: url.len(),
                max: self.max_url_len,
            });
        }
        Ok(url)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, HarvestError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| HarvestError::Request(format!("failed to reach E-utilities: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HarvestError::Request(format!(
                "E-utilities returned status {}",
                status
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| HarvestError::Parse(format!("bad JSON payload: {}", e)))
    }
}

#[async_trait]
impl SearchBackend for EntrezClient {
    async fn esearch(&self, db: SourceDb, term: &str) -> Result<SearchHandle, HarvestError> {
        let url = self.request_url(
            "esearch.fcgi",
            &[
                ("db", db.id()),
                ("term", term),
                ("usehistory", "y"),
                ("retmode", "json"),
                // ids come from the history session, not this response
                ("retmax", "0"),
            ],
        )?;

        let data: ESearchResponse = self.get_json(&url).await?;
        let handle = search_handle(data.esearchresult)?;
        tracing::debug!(db = db.id(), count = handle.count, "esearch opened history session");
        Ok(handle)
    }

    async fn esummary(
        &self,
        db: SourceDb,
        handle: &SearchHandle,
        retstart: usize,
        retmax: usize,
    ) -> Result<Vec<DocSummary>, HarvestError> {
        let retstart_s = retstart.to_string();
        let retmax_s = retmax.to_string();
        let url = self.request_url(
            "esummary.fcgi",
            &[
                ("db", db.id()),
                ("WebEnv", handle.webenv.as_str()),
                ("query_key", handle.query_key.as_str()),
                ("retmode", "json"),
                ("retstart", retstart_s.as_str()),
                ("retmax", retmax_s.as_str()),
            ],
        )?;

        let data: ESummaryResponse = self.get_json(&url).await?;
        let result = data
            .result
            .ok_or_else(|| HarvestError::Parse("esummary response without result".to_string()))?;

        let mut summaries = Vec::with_capacity(result.uids.len());
        for uid in &result.uids {
            let Some(value) = result.records.get(uid) else {
                continue;
            };
            match serde_json::from_value::<DocSummary>(value.clone()) {
                Ok(summary) => summaries.push(summary),
                Err(err) => {
                    tracing::warn!(uid = %uid, error = %err, "skipping malformed summary")
                }
            }
        }
        Ok(summaries)
    }
}

// ===== E-utilities JSON payloads =====

#[derive(Debug, Deserialize)]
struct ESearchResponse {
    esearchresult: ESearchResult,
}

#[derive(Debug, Deserialize)]
struct ESearchResult {
    count: String,
    #[serde(default)]
    webenv: Option<String>,
    #[serde(default)]
    querykey: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ESummaryResponse {
    #[serde(default)]
    result: Option<ESummaryResult>,
}

#[derive(Debug, Deserialize)]
struct ESummaryResult {
    #[serde(default)]
    uids: Vec<String>,
    #[serde(flatten)]
    records: HashMap<String, serde_json::Value>,
}

fn search_handle(result: ESearchResult) -> Result<SearchHandle, HarvestError> {
    let count: usize = result
        .count
        .parse()
        .map_err(|_| HarvestError::Parse(format!("non-numeric esearch count: {}", result.count)))?;

    // a zero-match search may legitimately omit the history session
    if count > 0 && (result.webenv.is_none() || result.querykey.is_none()) {
        return Err(HarvestError::Parse(
            "esearch response missing history session handles".to_string(),
        ));
    }

    Ok(SearchHandle {
        count,
        webenv: result.webenv.unwrap_or_default(),
        query_key: result.querykey.unwrap_or_default(),
    })
}
