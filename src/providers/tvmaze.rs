//! TVMaze fetcher.
//!
//! TVMaze is keyless and series-only: search shows by name, pick the best hit,
//! then read the show record.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use reelmerge_common::{MediaKind, ProviderId};

use super::fetcher::{FetchRequest, SourceFetcher};
use super::http::{build_url, HttpClient};
use super::mapping::map_tvmaze;
use crate::select::choose_result;
use crate::source::SourceRecord;

pub const TVMAZE_BASE_URL: &str = "https://api.tvmaze.com";

#[derive(Debug, Deserialize)]
struct TvmazeSearchHit {
    show: Value,
}

/// TVMaze source fetcher.
pub struct TvmazeFetcher {
    http: HttpClient,
    base_url: String,
}

impl TvmazeFetcher {
    pub fn new(requests_per_second: u32) -> anyhow::Result<Self> {
        Ok(Self {
            http: HttpClient::new(ProviderId::Tvmaze, requests_per_second)?,
            base_url: TVMAZE_BASE_URL.to_string(),
        })
    }

    /// Point the fetcher at another base URL (mock servers, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl SourceFetcher for TvmazeFetcher {
    fn provider(&self) -> ProviderId {
        ProviderId::Tvmaze
    }

    async fn fetch(&self, request: &FetchRequest) -> anyhow::Result<Option<SourceRecord>> {
        if request.kind != MediaKind::Series {
            return Ok(None);
        }
        let Some(title) = request.title.as_deref() else {
            return Ok(None);
        };

        let url = build_url(&self.base_url, "/search/shows", &[("q", title)]);
        let hits: Vec<TvmazeSearchHit> = self.http.get_json(&url).await?.unwrap_or_default();
        let shows: Vec<Value> = hits.into_iter().map(|hit| hit.show).collect();

        let Some(id) = choose_result(&shows, title)
            .and_then(|show| show.get("id"))
            .and_then(Value::as_u64)
        else {
            debug!(title = %title, hits = shows.len(), "No TVMaze match");
            return Ok(None);
        };

        let url = build_url(&self.base_url, &format!("/shows/{id}"), &[]);
        let show: Option<Value> = self.http.get_json(&url).await?;

        Ok(show.map(|show| map_tvmaze(&show, &request.content_key)))
    }
}
