//! Configuration management.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Harvest run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestConfig {
    /// NCBI API key; raises the request quota from 3/s to 10/s
    #[serde(default = "default_api_key")]
    pub api_key: Option<String>,

    /// E-utilities base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Maximum URL-encoded length of one partitioned query
    #[serde(default = "default_query_ceiling")]
    pub query_ceiling: usize,

    /// Maximum length of a full request URL (query ceiling plus headroom
    /// for the fixed request parameters)
    #[serde(default = "default_max_url_len")]
    pub max_url_len: usize,

    /// Result window size for paginated summary fetches
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Concurrent batch workers; kept low on purpose, concurrency beyond
    /// the shared request quota buys nothing
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Retry passes per failed or truncated batch
    #[serde(default = "default_retries")]
    pub retries: u32,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            api_key: default_api_key(),
            base_url: default_base_url(),
            query_ceiling: default_query_ceiling(),
            max_url_len: default_max_url_len(),
            page_size: default_page_size(),
            workers: default_workers(),
            retries: default_retries(),
        }
    }
}

fn default_api_key() -> Option<String> {
    std::env::var("NCBI_API_KEY").ok().filter(|k| !k.is_empty())
}

fn default_base_url() -> String {
    "https://eutils.ncbi.nlm.nih.gov/entrez/eutils".to_string()
}

fn default_query_ceiling() -> usize {
    2000
}

fn default_max_url_len() -> usize {
    // query ceiling plus room for the endpoint and fixed parameters
    2300
}

fn default_page_size() -> usize {
    1000
}

fn default_workers() -> usize {
    2
}

fn default_retries() -> u32 {
    1
}

/// Load configuration from a file, with `ENTREZ_HARVEST_*` environment
/// variables taking precedence
pub fn load_config(path: &PathBuf) -> Result<HarvestConfig, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path.as_path()))
        .add_source(config::Environment::with_prefix("ENTREZ_HARVEST"))
        .build()?;

    settings.try_deserialize()
}

/// Get the default configuration (from env vars or defaults)
pub fn get_config() -> HarvestConfig {
    HarvestConfig::default()
}
