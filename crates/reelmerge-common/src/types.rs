//! Core type definitions shared by fetchers, the engine, and the store.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a content key is a feature film or an episode of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// A single movie.
    Movie,
    /// An episode of a TV series.
    #[default]
    Series,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Movie => write!(f, "movie"),
            Self::Series => write!(f, "series"),
        }
    }
}

impl std::str::FromStr for MediaKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "movie" | "movies" | "film" => Ok(Self::Movie),
            "series" | "tv" | "episode" | "show" => Ok(Self::Series),
            other => Err(crate::Error::invalid_input(format!(
                "unknown media kind: {other}"
            ))),
        }
    }
}
