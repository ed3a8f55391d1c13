//! Merge policy registry.
//!
//! Binds every canonical field to a [`ValueType`] and exactly one
//! [`MergeStrategy`]. The default table below is the whole field universe:
//! source records naming anything else are ignored with a warning.
//!
//! Strategy parameters can be tuned per field from configuration; a bad
//! override fails registry construction instead of surfacing mid-pass.

pub mod strategy;
pub mod trusted;

use std::collections::BTreeMap;

use reelmerge_common::{Error, ProviderId, Result};

use crate::config::{FieldOverride, MergeConfig};
use crate::normalize::{normalize_value, Normalized, ValueType};
use crate::source::RawValue;

pub use strategy::{Candidate, MergeContext, MergeStrategy, Proposal};
pub use trusted::TrustedDomains;

/// Cast lists are capped at this many names.
pub const CAST_LIMIT: usize = 5;

/// One canonical field and how it merges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub value_type: ValueType,
    pub strategy: MergeStrategy,
}

impl FieldSpec {
    pub fn new(name: &str, value_type: ValueType, strategy: MergeStrategy) -> Self {
        Self {
            name: name.to_string(),
            value_type,
            strategy,
        }
    }
}

/// The field table plus the trusted image domains the image guard consults.
#[derive(Debug, Clone)]
pub struct PolicyRegistry {
    fields: BTreeMap<String, FieldSpec>,
    trusted: TrustedDomains,
}

impl Default for PolicyRegistry {
    fn default() -> Self {
        use MergeStrategy::*;
        use ProviderId::*;
        use ValueType as T;

        let prioritized = |order: &[ProviderId]| PrioritizedSource {
            order: order.to_vec(),
        };
        let probes = [Ffprobe, Mediainfo];

        let mut specs = vec![
            FieldSpec::new("season", T::Number, prioritized(&[Import, Tvdb, Tmdb, Tvmaze])),
            FieldSpec::new("episode", T::Number, prioritized(&[Import, Tvdb, Tmdb, Tvmaze])),
            FieldSpec::new("title", T::Text, prioritized(&[Storefront, Tvdb, Tmdb, Tvmaze, Omdb])),
            FieldSpec::new("dmovie", T::Text, LongestText { min_gain: 25 }),
            FieldSpec::new("dseries", T::Text, LongestText { min_gain: 25 }),
            FieldSpec::new("dseason", T::Text, ShortestText),
            FieldSpec::new("depisode", T::Text, LongestText { min_gain: 15 }),
            FieldSpec::new("airdate", T::Date, MajorityVote),
            FieldSpec::new("release", T::Date, prioritized(&[Storefront, Tmdb, Omdb])),
            FieldSpec::new("year", T::Year, MajorityVote),
            FieldSpec::new("network", T::Text, prioritized(&[Tmdb, Tvdb, Omdb, Tvmaze])),
            FieldSpec::new("studio", T::Text, prioritized(&[Storefront, Tmdb, Omdb])),
            FieldSpec::new(
                "genre",
                T::List,
                UnionList {
                    case_insensitive: true,
                    max_items: None,
                },
            ),
            FieldSpec::new("rating", T::Text, MajorityVote),
            FieldSpec::new(
                "cast",
                T::List,
                UnionList {
                    case_insensitive: true,
                    max_items: Some(CAST_LIMIT),
                },
            ),
            FieldSpec::new("source", T::Text, prioritized(&[Import, Storefront])),
            FieldSpec::new("resolution", T::Resolution, RankedQuality),
            FieldSpec::new("vcodec", T::VideoCodec, RankedQuality),
            FieldSpec::new("acodec", T::AudioCodec, RankedQuality),
            FieldSpec::new("achannels", T::Channels, RankedQuality),
            FieldSpec::new("vbitrate", T::Bitrate, prioritized(&[Mediainfo, Ffprobe])),
            FieldSpec::new("abitrate", T::Bitrate, prioritized(&probes)),
            FieldSpec::new("size", T::FileSize, prioritized(&probes)),
            FieldSpec::new("language", T::Language, prioritized(&probes)),
            FieldSpec::new("subtitles", T::Subtitles, PresenceUnion),
        ];

        for name in ["movie", "series"] {
            specs.push(FieldSpec::new(
                name,
                T::Text,
                prioritized(&[Storefront, Tmdb, Tvdb, Omdb, Tvmaze, Import]),
            ));
        }
        for name in ["imovie", "iseries", "iseason", "iepisode"] {
            specs.push(FieldSpec::new(name, T::ImageUrl, ImageProvenanceGuard));
        }
        for name in ["imdb", "tmdb", "tvdb", "tvmaze"] {
            specs.push(FieldSpec::new(name, T::Identifier, IdentityOverwrite));
        }
        for name in ["hdr", "framerate", "duration", "samplerate"] {
            specs.push(FieldSpec::new(name, T::Text, prioritized(&probes)));
        }

        Self {
            fields: specs.into_iter().map(|s| (s.name.clone(), s)).collect(),
            trusted: TrustedDomains::default(),
        }
    }
}

impl PolicyRegistry {
    /// Build the default table with configured overrides applied.
    ///
    /// Fails on overrides for unknown fields or parameters the field's
    /// strategy does not take.
    pub fn from_config(config: &MergeConfig) -> Result<Self> {
        let mut registry = Self::default();

        for (name, overrides) in &config.fields {
            let spec = registry
                .fields
                .get_mut(name)
                .ok_or_else(|| Error::unknown_field(name.clone()))?;
            apply_override(spec, overrides)?;
        }

        for (source, domains) in &config.trusted_domains {
            registry.trusted.set(source, domains);
        }

        Ok(registry)
    }

    pub fn get(&self, field: &str) -> Option<&FieldSpec> {
        self.fields.get(field)
    }

    /// All field specs, in field-name order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.values()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn trusted_domains(&self) -> &TrustedDomains {
        &self.trusted
    }

    /// Normalize a raw value the way `field` would, for display.
    pub fn normalize(&self, field: &str, raw: &RawValue) -> Result<Normalized> {
        let spec = self
            .get(field)
            .ok_or_else(|| Error::unknown_field(field))?;
        Ok(normalize_value(spec.value_type, raw))
    }
}

fn apply_override(spec: &mut FieldSpec, overrides: &FieldOverride) -> Result<()> {
    let name = spec.name.clone();
    let strategy_name = spec.strategy.name();
    let inapplicable = |param: &str| {
        Error::invalid_input(format!(
            "field '{name}' uses {strategy_name}, which has no '{param}' parameter"
        ))
    };

    if let Some(gain) = overrides.min_gain {
        match &mut spec.strategy {
            MergeStrategy::LongestText { min_gain } => *min_gain = gain,
            _ => return Err(inapplicable("min_gain")),
        }
    }

    if let Some(limit) = overrides.max_items {
        if limit == 0 {
            return Err(Error::invalid_input(format!(
                "field '{name}': max_items must be at least 1"
            )));
        }
        match &mut spec.strategy {
            MergeStrategy::UnionList { max_items, .. } => *max_items = Some(limit),
            _ => return Err(inapplicable("max_items")),
        }
    }

    if let Some(priority) = &overrides.priority {
        if priority.is_empty() {
            return Err(Error::invalid_input(format!(
                "field '{name}': priority must name at least one provider"
            )));
        }
        match &mut spec.strategy {
            MergeStrategy::PrioritizedSource { order } => *order = priority.clone(),
            _ => return Err(inapplicable("priority")),
        }
    }

    Ok(())
}
