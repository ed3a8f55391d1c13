//! Canonical record queries.
//!
//! Records are read as a header row plus one row per field, and written as
//! field-level upserts inside a single immediate transaction per content key.
//! The immediate transaction takes SQLite's write lock up front, so two
//! workers applying deltas for the same key serialize instead of interleaving.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use reelmerge_common::{ContentKey, Error, ProviderId, Result};

use crate::models::{AppliedDelta, CanonicalRecord, MergeDecision};
use crate::queries::merge_log;

/// Fetch the canonical record for `key`, or `None` if it has never been merged.
pub fn get_record(conn: &Connection, key: &ContentKey) -> Result<Option<CanonicalRecord>> {
    let header = conn
        .query_row(
            "SELECT created_at, last_updated_at FROM canonical_records WHERE content_key = ?",
            [key.as_str()],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
        )
        .optional()
        .map_err(|e| Error::database(e.to_string()))?;

    let Some((created_at, last_updated_at)) = header else {
        return Ok(None);
    };

    let mut stmt = conn
        .prepare(
            "SELECT field, value, provider FROM canonical_fields
             WHERE content_key = ? ORDER BY field",
        )
        .map_err(|e| Error::database(e.to_string()))?;

    let rows = stmt
        .query_map([key.as_str()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
            ))
        })
        .map_err(|e| Error::database(e.to_string()))?;

    let mut fields = BTreeMap::new();
    let mut provenance = BTreeMap::new();
    for row in rows {
        let (field, value, provider) = row.map_err(|e| Error::database(e.to_string()))?;
        if let Some(provider) = parse_provider(provider)? {
            provenance.insert(field.clone(), provider);
        }
        fields.insert(field, value);
    }

    Ok(Some(CanonicalRecord {
        content_key: key.clone(),
        fields,
        provenance,
        created_at: parse_timestamp(&created_at)?,
        last_updated_at: parse_timestamp(&last_updated_at)?,
    }))
}

/// Apply a delta as field-level upserts.
///
/// Each decision is a compare-and-set against the stored value, checked
/// under the transaction's write lock: a field whose value no longer equals
/// the decision's `old_value` is reported as stale and left untouched.
/// Creates the record header on first write. Decisions with an empty
/// `new_value` are skipped so a populated field is never cleared. Every
/// applied decision is appended to the merge log in the same transaction.
pub fn apply_delta(
    conn: &mut Connection,
    key: &ContentKey,
    decisions: &[MergeDecision],
    now: DateTime<Utc>,
) -> Result<AppliedDelta> {
    let mut outcome = AppliedDelta::default();
    let candidates: Vec<&MergeDecision> = decisions
        .iter()
        .filter(|d| !d.new_value.is_empty())
        .collect();
    if candidates.is_empty() {
        return Ok(outcome);
    }

    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|e| Error::database(e.to_string()))?;
    let now_str = now.to_rfc3339();

    let mut applicable = Vec::with_capacity(candidates.len());
    for decision in candidates {
        let stored = current_value(&tx, key, &decision.field)?;
        if stored.as_deref() == decision.old_value.as_deref() {
            applicable.push(decision);
        } else {
            outcome.stale.push(decision.field.clone());
        }
    }
    if applicable.is_empty() {
        return Ok(outcome);
    }

    tx.execute(
        "INSERT INTO canonical_records (content_key, created_at, last_updated_at)
         VALUES (?1, ?2, ?2)
         ON CONFLICT(content_key) DO UPDATE SET last_updated_at = excluded.last_updated_at",
        params![key.as_str(), now_str],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    for decision in applicable {
        tx.execute(
            "INSERT INTO canonical_fields (content_key, field, value, provider, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(content_key, field) DO UPDATE SET
                value = excluded.value,
                provider = excluded.provider,
                updated_at = excluded.updated_at",
            params![
                key.as_str(),
                decision.field,
                decision.new_value,
                decision.source.map(|p| p.as_str()),
                now_str,
            ],
        )
        .map_err(|e| Error::database(e.to_string()))?;

        merge_log::append(&tx, key, decision, now)?;
        outcome.applied.push(decision.field.clone());
    }

    tx.commit().map_err(|e| Error::database(e.to_string()))?;

    Ok(outcome)
}

fn current_value(conn: &Connection, key: &ContentKey, field: &str) -> Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM canonical_fields WHERE content_key = ? AND field = ?",
        params![key.as_str(), field],
        |row| row.get::<_, String>(0),
    )
    .optional()
    .map(|value| value.filter(|v| !v.is_empty()))
    .map_err(|e| Error::database(e.to_string()))
}

/// Delete the record for `key` (the upstream item was removed).
///
/// The merge log is left intact. Returns `true` if a record existed.
pub fn delete_record(conn: &Connection, key: &ContentKey) -> Result<bool> {
    let deleted = conn
        .execute(
            "DELETE FROM canonical_records WHERE content_key = ?",
            [key.as_str()],
        )
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(deleted > 0)
}

/// List every content key with a canonical record, in key order.
pub fn list_keys(conn: &Connection) -> Result<Vec<ContentKey>> {
    let mut stmt = conn
        .prepare("SELECT content_key FROM canonical_records ORDER BY content_key")
        .map_err(|e| Error::database(e.to_string()))?;

    let keys = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(keys.into_iter().map(ContentKey::new).collect())
}

pub(crate) fn parse_provider(value: Option<String>) -> Result<Option<ProviderId>> {
    value
        .map(|p| {
            p.parse::<ProviderId>()
                .map_err(|e| Error::database(format!("corrupt provider column: {e}")))
        })
        .transpose()
}

pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::database(format!("invalid timestamp '{value}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{get_conn, init_memory_pool};

    fn decision(field: &str, value: &str, source: Option<ProviderId>) -> MergeDecision {
        MergeDecision::new(field, None, value, source)
    }

    fn replace(field: &str, old: &str, value: &str) -> MergeDecision {
        MergeDecision::new(field, Some(old.to_string()), value, None)
    }

    #[test]
    fn test_missing_record_is_none() {
        let pool = init_memory_pool().unwrap();
        let conn = get_conn(&pool).unwrap();
        assert!(get_record(&conn, &ContentKey::new("nope")).unwrap().is_none());
    }

    #[test]
    fn test_apply_delta_creates_record() {
        let pool = init_memory_pool().unwrap();
        let mut conn = get_conn(&pool).unwrap();
        let key = ContentKey::new("abc");

        let written = apply_delta(
            &mut conn,
            &key,
            &[
                decision("series", "Lost", Some(ProviderId::Tvdb)),
                decision("genre", "Drama", None),
            ],
            Utc::now(),
        )
        .unwrap();
        assert_eq!(written.applied, vec!["series".to_string(), "genre".to_string()]);
        assert!(!written.is_stale());

        let record = get_record(&conn, &key).unwrap().unwrap();
        assert_eq!(record.get("series"), Some("Lost"));
        assert_eq!(record.source_of("series"), Some(ProviderId::Tvdb));
        assert_eq!(record.get("genre"), Some("Drama"));
        assert_eq!(record.source_of("genre"), None);
    }

    #[test]
    fn test_apply_delta_is_field_level() {
        let pool = init_memory_pool().unwrap();
        let mut conn = get_conn(&pool).unwrap();
        let key = ContentKey::new("abc");

        apply_delta(
            &mut conn,
            &key,
            &[
                decision("series", "Lost", None),
                decision("network", "ABC", None),
            ],
            Utc::now(),
        )
        .unwrap();

        // A later delta touching one field leaves the other alone.
        apply_delta(&mut conn, &key, &[replace("network", "ABC", "ABC Studios")], Utc::now())
            .unwrap();

        let record = get_record(&conn, &key).unwrap().unwrap();
        assert_eq!(record.get("series"), Some("Lost"));
        assert_eq!(record.get("network"), Some("ABC Studios"));
    }

    #[test]
    fn test_apply_delta_rejects_stale_old_value() {
        let pool = init_memory_pool().unwrap();
        let mut conn = get_conn(&pool).unwrap();
        let key = ContentKey::new("abc");

        apply_delta(&mut conn, &key, &[decision("resolution", "720p", None)], Utc::now())
            .unwrap();
        apply_delta(&mut conn, &key, &[replace("resolution", "720p", "2160p")], Utc::now())
            .unwrap();

        // Planned against 720p before the 2160p write landed.
        let outcome = apply_delta(
            &mut conn,
            &key,
            &[
                replace("resolution", "720p", "1080p"),
                decision("vcodec", "HEVC", None),
            ],
            Utc::now(),
        )
        .unwrap();
        assert_eq!(outcome.applied, vec!["vcodec".to_string()]);
        assert_eq!(outcome.stale, vec!["resolution".to_string()]);

        let record = get_record(&conn, &key).unwrap().unwrap();
        assert_eq!(record.get("resolution"), Some("2160p"));
        assert_eq!(merge_log::history(&conn, &key).unwrap().len(), 3);

        // A fully stale delta writes nothing, not even the header timestamp.
        let outcome = apply_delta(
            &mut conn,
            &key,
            &[decision("resolution", "480p", None)],
            Utc::now(),
        )
        .unwrap();
        assert_eq!(outcome.written(), 0);
        assert!(outcome.is_stale());
        assert_eq!(
            get_record(&conn, &key).unwrap().unwrap().last_updated_at,
            record.last_updated_at
        );
    }

    #[test]
    fn test_apply_delta_skips_empty_values() {
        let pool = init_memory_pool().unwrap();
        let mut conn = get_conn(&pool).unwrap();
        let key = ContentKey::new("abc");

        let written = apply_delta(&mut conn, &key, &[decision("series", "", None)], Utc::now())
            .unwrap();
        assert_eq!(written.written(), 0);
        assert!(get_record(&conn, &key).unwrap().is_none());
    }

    #[test]
    fn test_delete_and_list() {
        let pool = init_memory_pool().unwrap();
        let mut conn = get_conn(&pool).unwrap();

        for key in ["b", "a"] {
            apply_delta(
                &mut conn,
                &ContentKey::new(key),
                &[decision("series", "Lost", None)],
                Utc::now(),
            )
            .unwrap();
        }

        let keys = list_keys(&conn).unwrap();
        assert_eq!(keys, vec![ContentKey::new("a"), ContentKey::new("b")]);

        assert!(delete_record(&conn, &ContentKey::new("a")).unwrap());
        assert!(!delete_record(&conn, &ContentKey::new("a")).unwrap());
        assert!(get_record(&conn, &ContentKey::new("a")).unwrap().is_none());
        assert_eq!(list_keys(&conn).unwrap().len(), 1);
    }
}
