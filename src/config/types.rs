use std::collections::BTreeMap;
use std::path::PathBuf;

use reelmerge_common::ProviderId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub worker: WorkerConfig,

    #[serde(default)]
    pub providers: ProvidersConfig,

    #[serde(default)]
    pub merge: MergeConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// SQLite file holding canonical records and the merge log
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("reelmerge.db")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkerConfig {
    /// Content keys reconciled at the same time
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Provider lookups memoised per pass
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

fn default_concurrency() -> usize {
    4
}

fn default_cache_capacity() -> usize {
    1024
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProvidersConfig {
    /// TMDB v3 API key; TMDB is skipped when unset
    #[serde(default)]
    pub tmdb_api_key: Option<String>,

    /// OMDb API key; OMDb is skipped when unset
    #[serde(default)]
    pub omdb_api_key: Option<String>,

    /// Metadata language tag (e.g. "en-US")
    #[serde(default = "default_language")]
    pub language: String,

    /// Per-provider request budget
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,

    /// Override the TMDB API base URL (testing, proxies)
    #[serde(default)]
    pub tmdb_base_url: Option<String>,

    /// Override the OMDb API base URL
    #[serde(default)]
    pub omdb_base_url: Option<String>,

    /// Override the TVMaze API base URL
    #[serde(default)]
    pub tvmaze_base_url: Option<String>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            tmdb_api_key: None,
            omdb_api_key: None,
            language: default_language(),
            requests_per_second: default_requests_per_second(),
            tmdb_base_url: None,
            omdb_base_url: None,
            tvmaze_base_url: None,
        }
    }
}

fn default_language() -> String {
    "en-US".to_string()
}

fn default_requests_per_second() -> u32 {
    4
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MergeConfig {
    /// Per-field strategy parameter overrides, keyed by field name
    #[serde(default)]
    pub fields: BTreeMap<String, FieldOverride>,

    /// Extra or replacement trusted image domains, keyed by origin
    #[serde(default)]
    pub trusted_domains: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FieldOverride {
    /// Minimum extra characters before longer text replaces existing text
    #[serde(default)]
    pub min_gain: Option<usize>,

    /// Cap for union lists
    #[serde(default)]
    pub max_items: Option<usize>,

    /// Provider order for prioritized fields
    #[serde(default)]
    pub priority: Option<Vec<ProviderId>>,
}
