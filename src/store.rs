//! Canonical record storage.
//!
//! [`CanonicalStore`] is the seam between the pure engine and persistence.
//! Calls are blocking; async callers run them on a blocking thread.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use parking_lot::Mutex;
use reelmerge_common::{ContentKey, Error, Result};
use reelmerge_db::models::{AppliedDelta, CanonicalRecord, MergeDecision, MergeLogEntry};
use reelmerge_db::pool::{get_conn, DbPool};
use reelmerge_db::queries::{canonical, merge_log};

/// Where canonical records live.
pub trait CanonicalStore: Send + Sync {
    /// The canonical record for `key`, or `None` if never merged.
    fn get(&self, key: &ContentKey) -> Result<Option<CanonicalRecord>>;

    /// Apply a delta atomically.
    ///
    /// Each decision only lands while the field still holds its `old_value`;
    /// the rest come back as stale so the caller can re-plan from a fresh
    /// read. Decisions with empty values are skipped; applying an empty delta
    /// is a no-op that does not create the record.
    fn apply_delta(&self, key: &ContentKey, decisions: &[MergeDecision]) -> Result<AppliedDelta>;

    /// Forget a record (the upstream item was deleted). The audit log stays.
    fn remove(&self, key: &ContentKey) -> Result<bool>;

    /// Applied decisions for `key`, oldest first.
    fn history(&self, key: &ContentKey) -> Result<Vec<MergeLogEntry>>;

    /// Every content key with a canonical record.
    fn keys(&self) -> Result<Vec<ContentKey>>;
}

// ---------------------------------------------------------------------------
// SQLite
// ---------------------------------------------------------------------------

/// Store backed by the SQLite pool.
#[derive(Clone)]
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

impl CanonicalStore for SqliteStore {
    fn get(&self, key: &ContentKey) -> Result<Option<CanonicalRecord>> {
        let conn = get_conn(&self.pool)?;
        canonical::get_record(&conn, key)
    }

    fn apply_delta(&self, key: &ContentKey, decisions: &[MergeDecision]) -> Result<AppliedDelta> {
        let mut conn = get_conn(&self.pool)?;
        canonical::apply_delta(&mut conn, key, decisions, Utc::now())
    }

    fn remove(&self, key: &ContentKey) -> Result<bool> {
        let conn = get_conn(&self.pool)?;
        canonical::delete_record(&conn, key)
    }

    fn history(&self, key: &ContentKey) -> Result<Vec<MergeLogEntry>> {
        let conn = get_conn(&self.pool)?;
        merge_log::history(&conn, key)
    }

    fn keys(&self) -> Result<Vec<ContentKey>> {
        let conn = get_conn(&self.pool)?;
        canonical::list_keys(&conn)
    }
}

// ---------------------------------------------------------------------------
// In memory
// ---------------------------------------------------------------------------

#[derive(Default)]
struct MemoryState {
    records: BTreeMap<ContentKey, CanonicalRecord>,
    log: Vec<MergeLogEntry>,
}

/// Store kept in memory, for dry runs and tests.
///
/// Can be switched offline to exercise store failures.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    offline: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record directly, bypassing the merge log.
    pub fn insert(&self, record: CanonicalRecord) {
        self.state
            .lock()
            .records
            .insert(record.content_key.clone(), record);
    }

    /// Make every call fail with [`Error::StoreUnavailable`] until switched
    /// back.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.state.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().records.is_empty()
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::store_unavailable("memory store is offline"));
        }
        Ok(())
    }
}

impl CanonicalStore for MemoryStore {
    fn get(&self, key: &ContentKey) -> Result<Option<CanonicalRecord>> {
        self.check_online()?;
        Ok(self.state.lock().records.get(key).cloned())
    }

    fn apply_delta(&self, key: &ContentKey, decisions: &[MergeDecision]) -> Result<AppliedDelta> {
        self.check_online()?;

        if decisions.iter().all(|d| d.new_value.is_empty()) {
            return Ok(AppliedDelta::default());
        }

        let now = Utc::now();
        let mut state = self.state.lock();
        let MemoryState { records, log } = &mut *state;

        let mut record = records
            .get(key)
            .cloned()
            .unwrap_or_else(|| CanonicalRecord::new(key.clone(), now));
        let outcome = record.apply(decisions, now);
        if outcome.written() == 0 {
            return Ok(outcome);
        }

        for decision in decisions
            .iter()
            .filter(|d| outcome.applied.contains(&d.field))
        {
            log.push(MergeLogEntry {
                id: log.len() as i64 + 1,
                content_key: key.clone(),
                field: decision.field.clone(),
                old_value: decision.old_value.clone(),
                new_value: decision.new_value.clone(),
                source: decision.source,
                applied_at: now,
            });
        }
        records.insert(key.clone(), record);

        Ok(outcome)
    }

    fn remove(&self, key: &ContentKey) -> Result<bool> {
        self.check_online()?;
        Ok(self.state.lock().records.remove(key).is_some())
    }

    fn history(&self, key: &ContentKey) -> Result<Vec<MergeLogEntry>> {
        self.check_online()?;
        Ok(self
            .state
            .lock()
            .log
            .iter()
            .filter(|e| &e.content_key == key)
            .cloned()
            .collect())
    }

    fn keys(&self) -> Result<Vec<ContentKey>> {
        self.check_online()?;
        Ok(self.state.lock().records.keys().cloned().collect())
    }
}
