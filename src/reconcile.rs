//! The reconciliation engine.
//!
//! [`reconcile`] folds every source record for a content key into the
//! existing canonical record and returns the minimal set of field changes.
//! It is pure and stateless: persisting the delta is the store's job.
//!
//! Per field:
//! 1. collect one normalized candidate per provider (the most recently
//!    fetched when a provider reported the field more than once),
//! 2. drop unparsed candidates if any candidate parsed,
//! 3. let the field's strategy propose a value,
//! 4. emit a decision only when the proposal differs from the current value.
//!
//! Image fields run after every other field so the image guard sees the
//! item's origin as decided in the same pass.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use reelmerge_common::{ContentKey, ProviderId};
use reelmerge_db::models::{CanonicalRecord, MergeDecision};
use tracing::{debug, warn};

use crate::normalize::{normalize_value, Normalized, ValueType};
use crate::policy::{Candidate, FieldSpec, MergeContext, PolicyRegistry};
use crate::source::SourceRecord;

/// Canonical field naming the item's origin storefront.
pub const ORIGIN_FIELD: &str = "source";

/// One provider's best candidate for a field.
#[derive(Debug, Clone)]
struct Entry {
    fetched_at: DateTime<Utc>,
    normalized: Normalized,
}

impl Entry {
    /// Later fetches win; equal timestamps fall back to the value so the
    /// outcome does not depend on record order.
    fn supersedes(&self, other: &Entry) -> bool {
        (self.fetched_at, &self.normalized.value) > (other.fetched_at, &other.normalized.value)
    }
}

type FieldCandidates = BTreeMap<String, BTreeMap<ProviderId, Entry>>;

/// Compute the delta that brings `current` up to date with `sources`.
///
/// Records for a different content key and fields missing from the registry
/// are skipped with a warning. Decisions are sorted by field name and never
/// carry an empty value.
pub fn reconcile(
    registry: &PolicyRegistry,
    content_key: &ContentKey,
    current: Option<&CanonicalRecord>,
    sources: &[SourceRecord],
) -> Vec<MergeDecision> {
    let candidates = collect_candidates(registry, content_key, sources);

    let (images, others): (Vec<&FieldSpec>, Vec<&FieldSpec>) = registry
        .fields()
        .filter(|spec| candidates.contains_key(&spec.name))
        .partition(|spec| spec.value_type == ValueType::ImageUrl);

    let mut decisions = Vec::new();

    for spec in others {
        if let Some(decision) = decide(registry, spec, current, &candidates, None) {
            decisions.push(decision);
        }
    }

    // The origin decided this pass takes precedence over the stored one.
    let origin = decisions
        .iter()
        .find(|d| d.field == ORIGIN_FIELD)
        .map(|d| d.new_value.clone())
        .or_else(|| current.and_then(|c| c.get(ORIGIN_FIELD)).map(str::to_string));

    for spec in images {
        if let Some(decision) = decide(registry, spec, current, &candidates, origin.as_deref()) {
            decisions.push(decision);
        }
    }

    decisions.sort_by(|a, b| a.field.cmp(&b.field));

    debug!(
        content_key = %content_key,
        sources = sources.len(),
        decisions = decisions.len(),
        "Reconciled content key"
    );

    decisions
}

fn collect_candidates(
    registry: &PolicyRegistry,
    content_key: &ContentKey,
    sources: &[SourceRecord],
) -> FieldCandidates {
    let mut candidates: FieldCandidates = BTreeMap::new();

    for record in sources {
        if &record.content_key != content_key {
            warn!(
                content_key = %content_key,
                record_key = %record.content_key,
                provider = %record.provider,
                "Skipping source record for a different content key"
            );
            continue;
        }

        for (field, raw) in &record.fields {
            let Some(spec) = registry.get(field) else {
                warn!(
                    content_key = %content_key,
                    provider = %record.provider,
                    field = %field,
                    "Skipping unknown field"
                );
                continue;
            };

            if raw.is_empty() {
                continue;
            }

            let normalized = normalize_value(spec.value_type, raw);
            if normalized.is_empty() {
                debug!(
                    provider = %record.provider,
                    field = %field,
                    "Raw value normalized to nothing"
                );
                continue;
            }
            if !normalized.is_parsed() {
                debug!(
                    provider = %record.provider,
                    field = %field,
                    value = %normalized.value,
                    "Keeping unparsed value as a low-quality candidate"
                );
            }

            let entry = Entry {
                fetched_at: record.fetched_at,
                normalized,
            };
            let per_provider = candidates.entry(field.clone()).or_default();
            match per_provider.get(&record.provider) {
                Some(existing) if !entry.supersedes(existing) => {}
                _ => {
                    per_provider.insert(record.provider, entry);
                }
            }
        }
    }

    candidates
}

fn decide(
    registry: &PolicyRegistry,
    spec: &FieldSpec,
    current: Option<&CanonicalRecord>,
    candidates: &FieldCandidates,
    origin: Option<&str>,
) -> Option<MergeDecision> {
    let per_provider = candidates.get(&spec.name)?;

    // Provider order is global rank order, courtesy of BTreeMap.
    let any_parsed = per_provider.values().any(|e| e.normalized.is_parsed());
    let field_candidates: Vec<Candidate> = per_provider
        .iter()
        .filter(|(_, e)| e.normalized.is_parsed() || !any_parsed)
        .map(|(provider, e)| Candidate::new(*provider, e.normalized.value.clone()))
        .collect();

    let existing = current.and_then(|c| c.get(&spec.name));
    let ctx = MergeContext {
        existing,
        existing_source: current.and_then(|c| c.source_of(&spec.name)),
        origin,
        trusted: registry.trusted_domains(),
    };

    let proposal = spec
        .strategy
        .apply(spec.value_type, &ctx, &field_candidates)?;

    if proposal.value.is_empty() || Some(proposal.value.as_str()) == existing {
        return None;
    }

    debug!(
        field = %spec.name,
        strategy = spec.strategy.name(),
        old = ?existing,
        new = %proposal.value,
        source = ?proposal.source,
        "Field changed"
    );

    Some(MergeDecision::new(
        spec.name.clone(),
        existing.map(str::to_string),
        proposal.value,
        proposal.source,
    ))
}

/// Apply `decisions` to `current` in memory, creating the record if needed.
///
/// The in-memory counterpart of the store's delta application; decisions
/// with empty values or a stale `old_value` are ignored.
pub fn apply_decisions(
    content_key: &ContentKey,
    current: Option<CanonicalRecord>,
    decisions: &[MergeDecision],
    now: DateTime<Utc>,
) -> CanonicalRecord {
    let mut record = current.unwrap_or_else(|| CanonicalRecord::new(content_key.clone(), now));
    record.apply(decisions, now);
    record
}
