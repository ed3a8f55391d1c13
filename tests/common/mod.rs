//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`], which wires the default policy registry to an
//! in-memory SQLite store, plus small builders for source and canonical
//! records.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::Utc;
use reelmerge::policy::PolicyRegistry;
use reelmerge::providers::{FetcherRegistry, StaticFetcher};
use reelmerge::reconcile;
use reelmerge::source::SourceRecord;
use reelmerge::store::{CanonicalStore, SqliteStore};
use reelmerge::worker::ReconcilePass;
use reelmerge_common::{ContentKey, ProviderId};
use reelmerge_db::models::{CanonicalRecord, MergeDecision};
use reelmerge_db::pool::{init_memory_pool, DbPool};

/// Test harness wrapping a policy registry and a store backed by an
/// in-memory database.
pub struct TestHarness {
    pub db: DbPool,
    pub store: Arc<SqliteStore>,
    pub policy: PolicyRegistry,
}

impl TestHarness {
    /// Create a new harness with the default policy and an in-memory DB.
    pub fn new() -> Self {
        Self::with_policy(PolicyRegistry::default())
    }

    /// Create a new harness with a custom policy and an in-memory DB.
    pub fn with_policy(policy: PolicyRegistry) -> Self {
        let db = init_memory_pool().expect("failed to create in-memory pool");
        let store = Arc::new(SqliteStore::new(db.clone()));
        Self { db, store, policy }
    }

    /// Write fields straight into the store, attributed to `source`.
    pub fn seed(&self, key: &str, fields: &[(&str, &str)], source: Option<ProviderId>) {
        let current = self.current(key);
        let decisions: Vec<MergeDecision> = fields
            .iter()
            .map(|(field, value)| {
                let old = current
                    .as_ref()
                    .and_then(|c| c.get(field))
                    .map(str::to_string);
                MergeDecision::new(*field, old, *value, source)
            })
            .collect();
        self.store
            .apply_delta(&ContentKey::new(key), &decisions)
            .expect("failed to seed record");
    }

    /// Current canonical record for `key`.
    pub fn current(&self, key: &str) -> Option<CanonicalRecord> {
        self.store
            .get(&ContentKey::new(key))
            .expect("failed to read record")
    }

    /// Reconcile `sources` against the stored record without writing.
    pub fn plan(&self, key: &str, sources: &[SourceRecord]) -> Vec<MergeDecision> {
        let current = self.current(key);
        reconcile(&self.policy, &ContentKey::new(key), current.as_ref(), sources)
    }

    /// Reconcile `sources` and persist the delta.
    pub fn merge(&self, key: &str, sources: &[SourceRecord]) -> Vec<MergeDecision> {
        let decisions = self.plan(key, sources);
        self.store
            .apply_delta(&ContentKey::new(key), &decisions)
            .expect("failed to apply delta");
        decisions
    }

    /// A worker pass that replays `records` against this harness's store.
    pub fn pass(&self, records: Vec<SourceRecord>) -> ReconcilePass {
        let mut fetchers = FetcherRegistry::new();
        for fetcher in StaticFetcher::from_records(records) {
            fetchers.register(Arc::new(fetcher));
        }
        ReconcilePass::new(self.policy.clone(), fetchers, self.store.clone())
    }
}

/// An empty source record for `key`.
pub fn source(provider: ProviderId, key: &str) -> SourceRecord {
    SourceRecord::new(provider, key)
}

/// An in-memory canonical record with the given fields and no provenance.
pub fn canonical(key: &str, fields: &[(&str, &str)]) -> CanonicalRecord {
    let mut record = CanonicalRecord::new(ContentKey::new(key), Utc::now());
    for (field, value) in fields {
        record.fields.insert(field.to_string(), value.to_string());
    }
    record
}

/// Decision for `field`, if any.
pub fn decision<'a>(decisions: &'a [MergeDecision], field: &str) -> Option<&'a MergeDecision> {
    decisions.iter().find(|d| d.field == field)
}
