//! The closed set of metadata providers and their fixed ranking.
//!
//! Every tie-break in the merge policies goes through [`ProviderId::rank`];
//! declaration order below *is* the ranking, so reordering variants changes
//! merge results.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// An external (or local) source of metadata for a content key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    /// A scraped storefront page (Amazon, Netflix, ...).
    Storefront,
    /// The Movie Database.
    Tmdb,
    /// TheTVDB.
    Tvdb,
    /// OMDb (IMDb data).
    Omdb,
    /// TVMaze.
    Tvmaze,
    /// Technical specs probed with ffprobe.
    Ffprobe,
    /// Technical specs probed with mediainfo.
    Mediainfo,
    /// Values parsed from the imported file name and sidecar files.
    Import,
}

impl ProviderId {
    /// Every provider, highest priority first.
    pub const ALL: [ProviderId; 8] = [
        Self::Storefront,
        Self::Tmdb,
        Self::Tvdb,
        Self::Omdb,
        Self::Tvmaze,
        Self::Ffprobe,
        Self::Mediainfo,
        Self::Import,
    ];

    /// Global priority rank; lower wins.
    pub fn rank(self) -> usize {
        self as usize
    }

    /// Short lowercase identifier (e.g. `"tmdb"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Storefront => "storefront",
            Self::Tmdb => "tmdb",
            Self::Tvdb => "tvdb",
            Self::Omdb => "omdb",
            Self::Tvmaze => "tvmaze",
            Self::Ffprobe => "ffprobe",
            Self::Mediainfo => "mediainfo",
            Self::Import => "import",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == lower)
            // "imdb" is what most people call the OMDb feed.
            .or_else(|| (lower == "imdb").then_some(Self::Omdb))
            .ok_or_else(|| Error::invalid_input(format!("unknown provider: {s}")))
    }
}
