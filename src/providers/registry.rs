//! Fetcher registry for multi-provider lookups.
//!
//! The [`FetcherRegistry`] holds every configured [`SourceFetcher`] and asks
//! all available ones about an item concurrently. A provider that fails is
//! logged and skipped: the pass simply has fewer source records.

use std::sync::Arc;

use futures::future::join_all;
use reelmerge_common::ProviderId;
use tracing::{debug, warn};

use super::fetcher::{FetchRequest, SourceFetcher};
use super::omdb::OmdbFetcher;
use super::tmdb::TmdbFetcher;
use super::tvmaze::TvmazeFetcher;
use crate::cache::LookupCache;
use crate::config::ProvidersConfig;
use crate::source::SourceRecord;

/// A registry that manages multiple [`SourceFetcher`] implementations.
#[derive(Clone, Default)]
pub struct FetcherRegistry {
    fetchers: Vec<Arc<dyn SourceFetcher>>,
}

impl FetcherRegistry {
    /// Create an empty registry with no fetchers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the network fetchers the configuration enables.
    ///
    /// TMDB and OMDb need an API key and are left out without one; TVMaze is
    /// keyless and always registered.
    pub fn from_config(config: &ProvidersConfig) -> anyhow::Result<Self> {
        let mut registry = Self::new();
        let rps = config.requests_per_second;

        if let Some(key) = config.tmdb_api_key.as_deref().filter(|k| !k.is_empty()) {
            let mut tmdb = TmdbFetcher::new(key, config.language.as_str(), rps)?;
            if let Some(base) = &config.tmdb_base_url {
                tmdb = tmdb.with_base_url(base.as_str());
            }
            registry.register(Arc::new(tmdb));
        }

        if let Some(key) = config.omdb_api_key.as_deref().filter(|k| !k.is_empty()) {
            let mut omdb = OmdbFetcher::new(key, rps)?;
            if let Some(base) = &config.omdb_base_url {
                omdb = omdb.with_base_url(base.as_str());
            }
            registry.register(Arc::new(omdb));
        }

        let mut tvmaze = TvmazeFetcher::new(rps)?;
        if let Some(base) = &config.tvmaze_base_url {
            tvmaze = tvmaze.with_base_url(base.as_str());
        }
        registry.register(Arc::new(tvmaze));

        Ok(registry)
    }

    /// Register a fetcher. A later fetcher for the same provider replaces the
    /// earlier one.
    pub fn register(&mut self, fetcher: Arc<dyn SourceFetcher>) {
        self.fetchers.retain(|f| f.provider() != fetcher.provider());
        self.fetchers.push(fetcher);
    }

    /// Fetchers that are configured and ready, in provider order.
    pub fn available(&self) -> Vec<&Arc<dyn SourceFetcher>> {
        let mut available: Vec<_> = self.fetchers.iter().filter(|f| f.is_available()).collect();
        available.sort_by_key(|f| f.provider());
        available
    }

    /// Look up a fetcher by provider, available or not.
    pub fn get(&self, provider: ProviderId) -> Option<&Arc<dyn SourceFetcher>> {
        self.fetchers.iter().find(|f| f.provider() == provider)
    }

    pub fn len(&self) -> usize {
        self.fetchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fetchers.is_empty()
    }

    /// Ask every available fetcher about `request`, memoising results in
    /// `cache`.
    ///
    /// Failures are logged and dropped, and never cached, so the next pass
    /// asks again.
    pub async fn fetch_all(&self, request: &FetchRequest, cache: &LookupCache) -> Vec<SourceRecord> {
        let lookups = self.available().into_iter().map(|fetcher| async move {
            let provider = fetcher.provider();
            if let Some(cached) = cache.get(provider, request) {
                debug!(provider = %provider, content_key = %request.content_key, "Lookup cache hit");
                return cached;
            }

            match fetcher.fetch(request).await {
                Ok(record) => {
                    cache.insert(provider, request, record.clone());
                    record
                }
                Err(e) => {
                    warn!(
                        provider = %provider,
                        content_key = %request.content_key,
                        error = %format!("{e:#}"),
                        "Provider unavailable, continuing without it"
                    );
                    None
                }
            }
        });

        join_all(lookups).await.into_iter().flatten().collect()
    }
}
