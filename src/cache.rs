//! In-memory provider lookup cache.
//!
//! Memoises fetcher results per provider and full lookup request (content
//! key, title, kind, known IMDb id), so a provider is never asked the same
//! question twice while a changed title or id is always looked up afresh.
//! Misses are cached too.

use dashmap::DashMap;
use reelmerge_common::{ContentKey, ProviderId};
use std::time::{Duration, Instant};

use crate::providers::FetchRequest;
use crate::source::SourceRecord;

type CacheKey = (ProviderId, FetchRequest);

/// Entry in the lookup cache.
struct CacheEntry {
    record: Option<SourceRecord>,
    inserted_at: Instant,
    last_accessed: Instant,
}

/// Thread-safe cache for provider lookups.
pub struct LookupCache {
    entries: DashMap<CacheKey, CacheEntry>,
    max_entries: usize,
    ttl: Duration,
}

impl LookupCache {
    /// Create a new lookup cache.
    pub fn new(max_entries: usize, ttl_secs: u64) -> Self {
        Self {
            entries: DashMap::new(),
            max_entries: max_entries.max(1),
            ttl: Duration::from_secs(ttl_secs),
        }
    }

    /// Cached result for `provider` answering `request`.
    ///
    /// The outer `Option` is a cache miss, the inner one a provider that had
    /// nothing for the request.
    pub fn get(&self, provider: ProviderId, request: &FetchRequest) -> Option<Option<SourceRecord>> {
        let cache_key = (provider, request.clone());

        if let Some(mut entry) = self.entries.get_mut(&cache_key) {
            if entry.inserted_at.elapsed() < self.ttl {
                entry.last_accessed = Instant::now();
                return Some(entry.record.clone());
            }
            // Expired
            drop(entry);
            self.entries.remove(&cache_key);
        }

        None
    }

    /// Store a lookup result.
    pub fn insert(&self, provider: ProviderId, request: &FetchRequest, record: Option<SourceRecord>) {
        let cache_key = (provider, request.clone());

        // Evict old entries if at capacity
        if !self.entries.contains_key(&cache_key) && self.entries.len() >= self.max_entries {
            self.evict_oldest();
        }

        let now = Instant::now();
        self.entries.insert(
            cache_key,
            CacheEntry {
                record,
                inserted_at: now,
                last_accessed: now,
            },
        );
    }

    /// Drop every cached lookup for `key`.
    pub fn invalidate(&self, key: &ContentKey) {
        self.entries.retain(|(_, request), _| &request.content_key != key);
    }

    /// Clear all entries.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Get the number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict_oldest(&self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.last_accessed)
            .map(|entry| entry.key().clone());

        if let Some(key) = oldest {
            self.entries.remove(&key);
        }
    }
}

impl Default for LookupCache {
    fn default() -> Self {
        // Default: 1024 entries, 1 hour TTL
        Self::new(1024, 3600)
    }
}
