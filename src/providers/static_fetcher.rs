//! Replays pre-fetched source records.
//!
//! Used for JSON input on the command line and as a deterministic fetcher in
//! tests.

use std::collections::HashMap;

use async_trait::async_trait;
use reelmerge_common::{ContentKey, ProviderId};

use super::fetcher::{FetchRequest, SourceFetcher};
use crate::source::SourceRecord;

/// Serves one provider's records straight from memory.
pub struct StaticFetcher {
    provider: ProviderId,
    records: HashMap<ContentKey, SourceRecord>,
}

impl StaticFetcher {
    pub fn new(provider: ProviderId) -> Self {
        Self {
            provider,
            records: HashMap::new(),
        }
    }

    /// Add a record. Records from other providers are ignored; a second
    /// record for the same key replaces the first.
    pub fn with_record(mut self, record: SourceRecord) -> Self {
        self.insert(record);
        self
    }

    pub fn insert(&mut self, record: SourceRecord) {
        if record.provider == self.provider {
            self.records.insert(record.content_key.clone(), record);
        }
    }

    /// One fetcher per provider present in `records`, in provider order.
    pub fn from_records(records: impl IntoIterator<Item = SourceRecord>) -> Vec<StaticFetcher> {
        let mut by_provider: HashMap<ProviderId, StaticFetcher> = HashMap::new();
        for record in records {
            by_provider
                .entry(record.provider)
                .or_insert_with(|| StaticFetcher::new(record.provider))
                .insert(record);
        }

        let mut fetchers: Vec<StaticFetcher> = by_provider.into_values().collect();
        fetchers.sort_by_key(|f| f.provider);
        fetchers
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl SourceFetcher for StaticFetcher {
    fn provider(&self) -> ProviderId {
        self.provider
    }

    async fn fetch(&self, request: &FetchRequest) -> anyhow::Result<Option<SourceRecord>> {
        Ok(self.records.get(&request.content_key).cloned())
    }
}
