//! Append-only audit log of applied merge decisions.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use reelmerge_common::{ContentKey, Error, Result};

use crate::models::{MergeDecision, MergeLogEntry};
use crate::queries::canonical::{parse_provider, parse_timestamp};

/// Record one applied decision. Called inside the delta transaction.
pub(crate) fn append(
    conn: &Connection,
    key: &ContentKey,
    decision: &MergeDecision,
    applied_at: DateTime<Utc>,
) -> Result<()> {
    conn.execute(
        "INSERT INTO merge_log (content_key, field, old_value, new_value, provider, applied_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            key.as_str(),
            decision.field,
            decision.old_value,
            decision.new_value,
            decision.source.map(|p| p.as_str()),
            applied_at.to_rfc3339(),
        ],
    )
    .map_err(|e| Error::database(e.to_string()))?;
    Ok(())
}

/// All logged decisions for `key`, oldest first.
pub fn history(conn: &Connection, key: &ContentKey) -> Result<Vec<MergeLogEntry>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, field, old_value, new_value, provider, applied_at
             FROM merge_log WHERE content_key = ? ORDER BY id",
        )
        .map_err(|e| Error::database(e.to_string()))?;

    let rows = stmt
        .query_map([key.as_str()], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, String>(5)?,
            ))
        })
        .map_err(|e| Error::database(e.to_string()))?;

    let mut entries = Vec::new();
    for row in rows {
        let (id, field, old_value, new_value, provider, applied_at) =
            row.map_err(|e| Error::database(e.to_string()))?;
        entries.push(MergeLogEntry {
            id,
            content_key: key.clone(),
            field,
            old_value,
            new_value,
            source: parse_provider(provider)?,
            applied_at: parse_timestamp(&applied_at)?,
        });
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{get_conn, init_memory_pool};
    use crate::queries::canonical::{apply_delta, delete_record};
    use reelmerge_common::ProviderId;

    #[test]
    fn test_history_records_each_applied_decision() {
        let pool = init_memory_pool().unwrap();
        let mut conn = get_conn(&pool).unwrap();
        let key = ContentKey::new("abc");

        apply_delta(
            &mut conn,
            &key,
            &[MergeDecision::new("resolution", None, "720p", Some(ProviderId::Mediainfo))],
            Utc::now(),
        )
        .unwrap();
        apply_delta(
            &mut conn,
            &key,
            &[MergeDecision::new(
                "resolution",
                Some("720p".into()),
                "1080p",
                Some(ProviderId::Ffprobe),
            )],
            Utc::now(),
        )
        .unwrap();

        let log = history(&conn, &key).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].new_value, "720p");
        assert_eq!(log[1].old_value.as_deref(), Some("720p"));
        assert_eq!(log[1].new_value, "1080p");
        assert_eq!(log[1].source, Some(ProviderId::Ffprobe));
    }

    #[test]
    fn test_history_survives_record_deletion() {
        let pool = init_memory_pool().unwrap();
        let mut conn = get_conn(&pool).unwrap();
        let key = ContentKey::new("abc");

        apply_delta(
            &mut conn,
            &key,
            &[MergeDecision::new("series", None, "Lost", None)],
            Utc::now(),
        )
        .unwrap();
        delete_record(&conn, &key).unwrap();

        assert_eq!(history(&conn, &key).unwrap().len(), 1);
    }
}
