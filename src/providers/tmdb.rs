//! TMDB (The Movie Database) fetcher.
//!
//! Searches TMDB v3 by title, picks the best hit with
//! [`choose_result`](crate::select::choose_result), then fetches the detail
//! record with credits and external ids in one request.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use reelmerge_common::{MediaKind, ProviderId};

use super::fetcher::{FetchRequest, SourceFetcher};
use super::http::{build_url, HttpClient};
use super::mapping::map_tmdb;
use crate::select::choose_result;
use crate::source::SourceRecord;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";

// ---------------------------------------------------------------------------
// TMDB API response types (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TmdbSearchResponse {
    #[serde(default)]
    results: Vec<Value>,
}

// ---------------------------------------------------------------------------
// Fetcher implementation
// ---------------------------------------------------------------------------

/// TMDB source fetcher.
///
/// # Examples
///
/// ```no_run
/// use reelmerge::providers::TmdbFetcher;
///
/// let fetcher = TmdbFetcher::new("your-api-key", "en-US", 4).unwrap();
/// ```
pub struct TmdbFetcher {
    http: HttpClient,
    api_key: String,
    language: String,
    base_url: String,
}

impl TmdbFetcher {
    /// Create a fetcher against the public TMDB API.
    pub fn new(
        api_key: impl Into<String>,
        language: impl Into<String>,
        requests_per_second: u32,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            http: HttpClient::new(ProviderId::Tmdb, requests_per_second)?,
            api_key: api_key.into(),
            language: language.into(),
            base_url: TMDB_BASE_URL.to_string(),
        })
    }

    /// Point the fetcher at another base URL (mock servers, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Build a full API URL with the API key and language query parameters.
    fn url(&self, path: &str, extra_params: &[(&str, &str)]) -> String {
        let mut params = vec![
            ("api_key", self.api_key.as_str()),
            ("language", self.language.as_str()),
        ];
        params.extend_from_slice(extra_params);
        build_url(&self.base_url, path, &params)
    }

    /// Search by title and return the id of the best hit.
    async fn search(&self, title: &str, kind: MediaKind) -> anyhow::Result<Option<u64>> {
        let path = match kind {
            MediaKind::Movie => "/search/movie",
            MediaKind::Series => "/search/tv",
        };
        let url = self.url(path, &[("query", title)]);

        let Some(body) = self.http.get_json::<TmdbSearchResponse>(&url).await? else {
            return Ok(None);
        };

        let chosen = choose_result(&body.results, title);
        debug!(
            title = %title,
            hits = body.results.len(),
            chosen = ?chosen.and_then(|hit| hit.get("id")),
            "TMDB search"
        );

        Ok(chosen.and_then(|hit| hit.get("id")).and_then(Value::as_u64))
    }

    async fn detail(&self, id: u64, kind: MediaKind) -> anyhow::Result<Option<Value>> {
        let path = match kind {
            MediaKind::Movie => format!("/movie/{id}"),
            MediaKind::Series => format!("/tv/{id}"),
        };
        let url = self.url(&path, &[("append_to_response", "credits,external_ids")]);
        self.http.get_json(&url).await
    }
}

#[async_trait]
impl SourceFetcher for TmdbFetcher {
    fn provider(&self) -> ProviderId {
        ProviderId::Tmdb
    }

    fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn fetch(&self, request: &FetchRequest) -> anyhow::Result<Option<SourceRecord>> {
        let Some(title) = request.title.as_deref() else {
            debug!(content_key = %request.content_key, "TMDB needs a title, skipping");
            return Ok(None);
        };

        let Some(id) = self.search(title, request.kind).await? else {
            return Ok(None);
        };

        let record = self
            .detail(id, request.kind)
            .await?
            .map(|detail| map_tmdb(&detail, request.kind, &request.content_key));

        Ok(record)
    }
}
