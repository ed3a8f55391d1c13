//! Merge strategies.
//!
//! A strategy looks at the existing canonical value and the field's
//! candidates and proposes the value the field should hold. Candidates arrive
//! already normalized, one per provider, in global provider rank order; every
//! tie-break below relies on that order.

use reelmerge_common::ProviderId;
use serde::{Deserialize, Serialize};

use super::trusted::TrustedDomains;
use crate::normalize::language::SubtitlePresence;
use crate::normalize::text::{join_list, split_list};
use crate::normalize::ValueType;

/// One provider's normalized value for a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub provider: ProviderId,
    pub value: String,
}

impl Candidate {
    pub fn new(provider: ProviderId, value: impl Into<String>) -> Self {
        Self {
            provider,
            value: value.into(),
        }
    }
}

/// A strategy's proposed value, with the provider that supplied it when a
/// single provider did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proposal {
    pub value: String,
    pub source: Option<ProviderId>,
}

impl Proposal {
    fn single(candidate: &Candidate) -> Self {
        Self {
            value: candidate.value.clone(),
            source: Some(candidate.provider),
        }
    }

    fn composite(value: String) -> Self {
        Self {
            value,
            source: None,
        }
    }
}

/// What a strategy can see besides the candidates.
#[derive(Debug, Clone, Copy)]
pub struct MergeContext<'a> {
    /// Current canonical value, if populated.
    pub existing: Option<&'a str>,
    /// Provider that supplied `existing`, if known.
    pub existing_source: Option<ProviderId>,
    /// The item's origin (canonical `source` field), used by the image guard.
    pub origin: Option<&'a str>,
    pub trusted: &'a TrustedDomains,
}

/// How a field combines its candidates with the existing value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum MergeStrategy {
    /// First candidate in a fixed provider order.
    PrioritizedSource { order: Vec<ProviderId> },
    /// Most frequent candidate value.
    MajorityVote,
    /// Longer text wins once it is at least `min_gain` characters longer.
    LongestText { min_gain: usize },
    /// Strictly shorter text wins.
    ShortestText,
    /// Strictly higher rank (per the field's value type) wins.
    RankedQuality,
    /// Ordered union of list items.
    UnionList {
        case_insensitive: bool,
        max_items: Option<usize>,
    },
    /// Keeps artwork hosted by the item's own storefront.
    ImageProvenanceGuard,
    /// External ids are adopted once and never changed.
    IdentityOverwrite,
    /// OR of subtitle presence flags.
    PresenceUnion,
}

impl MergeStrategy {
    /// Short name used in logs and validation messages.
    pub fn name(&self) -> &'static str {
        match self {
            MergeStrategy::PrioritizedSource { .. } => "prioritized_source",
            MergeStrategy::MajorityVote => "majority_vote",
            MergeStrategy::LongestText { .. } => "longest_text",
            MergeStrategy::ShortestText => "shortest_text",
            MergeStrategy::RankedQuality => "ranked_quality",
            MergeStrategy::UnionList { .. } => "union_list",
            MergeStrategy::ImageProvenanceGuard => "image_provenance_guard",
            MergeStrategy::IdentityOverwrite => "identity_overwrite",
            MergeStrategy::PresenceUnion => "presence_union",
        }
    }

    /// Propose a value for the field.
    ///
    /// `None` means "keep what is there". A proposal equal to the existing
    /// value is also a no-op; the caller decides whether anything changed.
    pub fn apply(
        &self,
        value_type: ValueType,
        ctx: &MergeContext<'_>,
        candidates: &[Candidate],
    ) -> Option<Proposal> {
        let candidates: Vec<&Candidate> =
            candidates.iter().filter(|c| !c.value.is_empty()).collect();
        if candidates.is_empty() {
            return None;
        }

        match self {
            MergeStrategy::PrioritizedSource { order } => prioritized(order, ctx, &candidates),
            MergeStrategy::MajorityVote => majority(&candidates),
            MergeStrategy::LongestText { min_gain } => longest(*min_gain, ctx, &candidates),
            MergeStrategy::ShortestText => shortest(ctx, &candidates),
            MergeStrategy::RankedQuality => ranked(value_type, ctx, &candidates),
            MergeStrategy::UnionList {
                case_insensitive,
                max_items,
            } => union_list(*case_insensitive, *max_items, ctx, &candidates),
            MergeStrategy::ImageProvenanceGuard => image_guard(ctx, &candidates),
            MergeStrategy::IdentityOverwrite => match ctx.existing {
                Some(_) => None,
                None => Some(Proposal::single(candidates[0])),
            },
            MergeStrategy::PresenceUnion => presence_union(ctx, &candidates),
        }
    }
}

/// Position of `provider` in `order`; unlisted providers follow in global
/// rank order.
pub fn priority_position(order: &[ProviderId], provider: ProviderId) -> usize {
    order
        .iter()
        .position(|p| *p == provider)
        .unwrap_or(order.len() + provider.rank())
}

fn prioritized(
    order: &[ProviderId],
    ctx: &MergeContext<'_>,
    candidates: &[&Candidate],
) -> Option<Proposal> {
    let best = candidates
        .iter()
        .min_by_key(|c| priority_position(order, c.provider))?;

    // A value from a higher-priority provider is not displaced by a
    // lower-priority one, even if that provider is absent this pass.
    if let (Some(_), Some(existing_source)) = (ctx.existing, ctx.existing_source) {
        if priority_position(order, best.provider) > priority_position(order, existing_source) {
            return None;
        }
    }

    Some(Proposal::single(best))
}

fn majority(candidates: &[&Candidate]) -> Option<Proposal> {
    // (value, votes, first candidate index); first index preserves rank order.
    let mut tally: Vec<(&str, usize, usize)> = Vec::new();
    for (idx, c) in candidates.iter().enumerate() {
        match tally.iter_mut().find(|(v, _, _)| *v == c.value) {
            Some(entry) => entry.1 += 1,
            None => tally.push((c.value.as_str(), 1, idx)),
        }
    }

    let (_, _, idx) = tally
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(b.2.cmp(&a.2)))?;
    Some(Proposal::single(candidates[idx]))
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn longest(min_gain: usize, ctx: &MergeContext<'_>, candidates: &[&Candidate]) -> Option<Proposal> {
    // max_by_key keeps the last maximum; reverse so the higher-ranked wins ties.
    let best = candidates
        .iter()
        .rev()
        .max_by_key(|c| char_len(&c.value))?;

    match ctx.existing {
        Some(existing) if char_len(&best.value) < char_len(existing) + min_gain => None,
        _ => Some(Proposal::single(best)),
    }
}

fn shortest(ctx: &MergeContext<'_>, candidates: &[&Candidate]) -> Option<Proposal> {
    let best = candidates.iter().min_by_key(|c| char_len(&c.value))?;

    match ctx.existing {
        Some(existing) if char_len(&best.value) >= char_len(existing) => None,
        _ => Some(Proposal::single(best)),
    }
}

fn ranked(
    value_type: ValueType,
    ctx: &MergeContext<'_>,
    candidates: &[&Candidate],
) -> Option<Proposal> {
    let best = candidates
        .iter()
        .rev()
        .max_by_key(|c| value_type.rank(&c.value))?;

    match ctx.existing {
        Some(existing) if value_type.rank(&best.value) <= value_type.rank(existing) => None,
        _ => Some(Proposal::single(best)),
    }
}

fn union_list(
    case_insensitive: bool,
    max_items: Option<usize>,
    ctx: &MergeContext<'_>,
    candidates: &[&Candidate],
) -> Option<Proposal> {
    let existing = ctx.existing.map(split_list).unwrap_or_default();
    // A cap never drops items the record already has.
    let cap = max_items.map(|m| m.max(existing.len()));

    let mut items: Vec<String> = Vec::new();
    let incoming = candidates.iter().flat_map(|c| split_list(&c.value));
    for item in existing.into_iter().chain(incoming) {
        let seen = items.iter().any(|i| {
            if case_insensitive {
                i.to_lowercase() == item.to_lowercase()
            } else {
                *i == item
            }
        });
        if !seen {
            items.push(item);
        }
    }

    if let Some(cap) = cap {
        items.truncate(cap);
    }

    if items.is_empty() {
        None
    } else {
        Some(Proposal::composite(join_list(&items)))
    }
}

fn image_guard(ctx: &MergeContext<'_>, candidates: &[&Candidate]) -> Option<Proposal> {
    let origin = ctx.origin.filter(|o| !o.trim().is_empty());

    if let (Some(existing), Some(origin)) = (ctx.existing, origin) {
        if ctx.trusted.is_trusted(origin, existing) {
            return None;
        }
    }

    let preferred = origin.and_then(|origin| {
        candidates
            .iter()
            .find(|c| ctx.trusted.is_trusted(origin, &c.value))
    });

    Some(Proposal::single(preferred.unwrap_or(&candidates[0])))
}

fn presence_union(ctx: &MergeContext<'_>, candidates: &[&Candidate]) -> Option<Proposal> {
    let mut merged: Option<SubtitlePresence> = ctx.existing.and_then(SubtitlePresence::parse);
    for c in candidates {
        if let Some(p) = SubtitlePresence::parse(&c.value) {
            merged = Some(merged.map_or(p, |m| m.union(p)));
        }
    }
    merged.map(|p| Proposal::composite(p.as_str().to_string()))
}
