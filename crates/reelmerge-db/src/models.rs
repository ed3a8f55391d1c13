//! Rust models matching the database schema.
//!
//! [`CanonicalRecord`] is the reconciled view of one content key,
//! [`MergeDecision`] is one field change produced by a reconciliation pass,
//! and [`MergeLogEntry`] is an applied decision as recorded in the audit log.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use reelmerge_common::{ContentKey, ProviderId};
use serde::{Deserialize, Serialize};

/// The single reconciled, best-known metadata view for a content key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CanonicalRecord {
    pub content_key: ContentKey,
    /// Canonical value per field name. Never contains empty strings.
    pub fields: BTreeMap<String, String>,
    /// Provider that supplied each field's current value, when a single
    /// provider did (unions and flag merges have no single source).
    #[serde(default)]
    pub provenance: BTreeMap<String, ProviderId>,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
}

impl CanonicalRecord {
    /// Create an empty record for `content_key`.
    pub fn new(content_key: ContentKey, now: DateTime<Utc>) -> Self {
        Self {
            content_key,
            fields: BTreeMap::new(),
            provenance: BTreeMap::new(),
            created_at: now,
            last_updated_at: now,
        }
    }

    /// Current value of `field`, if populated.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .get(field)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Provider that supplied the current value of `field`, if known.
    pub fn source_of(&self, field: &str) -> Option<ProviderId> {
        self.provenance.get(field).copied()
    }

    /// Apply a delta in memory.
    ///
    /// Each decision is a compare-and-set: it is written only while the field
    /// still holds the decision's `old_value`, otherwise it is reported as
    /// stale and skipped. Decisions carrying an empty `new_value` are ignored,
    /// so a record can only ever gain or improve fields.
    pub fn apply(&mut self, decisions: &[MergeDecision], now: DateTime<Utc>) -> AppliedDelta {
        let mut outcome = AppliedDelta::default();
        for decision in decisions.iter().filter(|d| !d.new_value.is_empty()) {
            if self.get(&decision.field) != decision.old_value.as_deref() {
                outcome.stale.push(decision.field.clone());
                continue;
            }
            self.fields
                .insert(decision.field.clone(), decision.new_value.clone());
            match decision.source {
                Some(provider) => {
                    self.provenance.insert(decision.field.clone(), provider);
                }
                None => {
                    self.provenance.remove(&decision.field);
                }
            }
            outcome.applied.push(decision.field.clone());
        }
        if outcome.written() > 0 {
            self.last_updated_at = now;
        }
        outcome
    }
}

/// Result of applying a delta: fields written and fields skipped because
/// their stored value no longer matched the decision's `old_value`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedDelta {
    pub applied: Vec<String>,
    pub stale: Vec<String>,
}

impl AppliedDelta {
    /// Number of fields written.
    pub fn written(&self) -> usize {
        self.applied.len()
    }

    /// Whether any decision lost a race with a concurrent writer.
    pub fn is_stale(&self) -> bool {
        !self.stale.is_empty()
    }
}

/// One field change produced by a reconciliation pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MergeDecision {
    pub field: String,
    pub old_value: Option<String>,
    pub new_value: String,
    pub changed: bool,
    /// Winning provider; `None` for composite values.
    pub source: Option<ProviderId>,
}

impl MergeDecision {
    /// Build a decision, deriving `changed` from the old and new values.
    pub fn new(
        field: impl Into<String>,
        old_value: Option<String>,
        new_value: impl Into<String>,
        source: Option<ProviderId>,
    ) -> Self {
        let new_value = new_value.into();
        let changed = old_value.as_deref() != Some(new_value.as_str());
        Self {
            field: field.into(),
            old_value,
            new_value,
            changed,
            source,
        }
    }
}

/// An applied merge decision as recorded in the append-only audit log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MergeLogEntry {
    pub id: i64,
    pub content_key: ContentKey,
    pub field: String,
    pub old_value: Option<String>,
    pub new_value: String,
    pub source: Option<ProviderId>,
    pub applied_at: DateTime<Utc>,
}
