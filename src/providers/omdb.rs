//! OMDb fetcher.
//!
//! Looks a title up directly by IMDb id when one is known, otherwise searches
//! by name and picks the best hit. OMDb answers "not found" with HTTP 200 and
//! `"Response": "False"`.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use reelmerge_common::{MediaKind, ProviderId};

use super::fetcher::{FetchRequest, SourceFetcher};
use super::http::{build_url, HttpClient};
use super::mapping::map_omdb;
use crate::select::choose_result;
use crate::source::SourceRecord;

pub const OMDB_BASE_URL: &str = "https://www.omdbapi.com";

/// OMDb source fetcher.
pub struct OmdbFetcher {
    http: HttpClient,
    api_key: String,
    base_url: String,
}

impl OmdbFetcher {
    pub fn new(api_key: impl Into<String>, requests_per_second: u32) -> anyhow::Result<Self> {
        Ok(Self {
            http: HttpClient::new(ProviderId::Omdb, requests_per_second)?,
            api_key: api_key.into(),
            base_url: OMDB_BASE_URL.to_string(),
        })
    }

    /// Point the fetcher at another base URL (mock servers, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn query(&self, params: &[(&str, &str)]) -> anyhow::Result<Option<Value>> {
        let mut all = vec![("apikey", self.api_key.as_str())];
        all.extend_from_slice(params);
        let url = build_url(&self.base_url, "/", &all);

        let body: Option<Value> = self.http.get_json(&url).await?;
        Ok(body.filter(|b| b.get("Response").and_then(Value::as_str) != Some("False")))
    }

    async fn search(&self, title: &str, kind: MediaKind) -> anyhow::Result<Option<String>> {
        let Some(body) = self.query(&[("s", title), ("type", omdb_type(kind))]).await? else {
            return Ok(None);
        };

        let hits = body
            .get("Search")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let imdb_id = choose_result(&hits, title)
            .and_then(|hit| hit.get("imdbID"))
            .and_then(Value::as_str)
            .map(str::to_string);
        debug!(title = %title, hits = hits.len(), imdb_id = ?imdb_id, "OMDb search");

        Ok(imdb_id)
    }
}

fn omdb_type(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Movie => "movie",
        MediaKind::Series => "series",
    }
}

#[async_trait]
impl SourceFetcher for OmdbFetcher {
    fn provider(&self) -> ProviderId {
        ProviderId::Omdb
    }

    fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn fetch(&self, request: &FetchRequest) -> anyhow::Result<Option<SourceRecord>> {
        let imdb_id = match (&request.imdb_id, &request.title) {
            (Some(id), _) => id.clone(),
            (None, Some(title)) => match self.search(title, request.kind).await? {
                Some(id) => id,
                None => return Ok(None),
            },
            (None, None) => return Ok(None),
        };

        let detail = self.query(&[("i", imdb_id.as_str()), ("plot", "full")]).await?;
        Ok(detail.map(|d| map_omdb(&d, request.kind, &request.content_key)))
    }
}
