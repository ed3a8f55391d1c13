//! Field normalization.
//!
//! Turns raw provider values into canonical text, one function per
//! [`ValueType`]. Every normalizer is total (bad input never errors), pure and
//! idempotent: feeding a normalized value back in returns it unchanged.
//!
//! Results carry a [`Quality`] so the engine can prefer properly parsed
//! candidates over passthrough text.
//!
//! # Module layout
//!
//! - [`date`] -- calendar dates
//! - [`technical`] -- resolution, codecs, channels, bitrate, file size
//! - [`language`] -- language codes and subtitle presence
//! - [`text`] -- free text, lists, numbers, years, identifiers, image URLs

pub mod date;
pub mod language;
pub mod technical;
pub mod text;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::source::RawValue;

/// How a canonical field's values are parsed and compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Text,
    List,
    Number,
    Year,
    Date,
    Identifier,
    ImageUrl,
    Resolution,
    VideoCodec,
    AudioCodec,
    Channels,
    Bitrate,
    FileSize,
    Language,
    Subtitles,
}

impl ValueType {
    /// Quality rank of an already-normalized value, for ordered types.
    ///
    /// Types without a natural order rank everything as 0.
    pub fn rank(self, value: &str) -> u32 {
        match self {
            ValueType::Resolution => technical::resolution_rank(value),
            ValueType::VideoCodec => technical::video_codec_rank(value),
            ValueType::AudioCodec => technical::audio_codec_rank(value),
            ValueType::Channels => technical::channels_rank(value),
            _ => 0,
        }
    }

    /// Whether [`rank`](Self::rank) is meaningful for this type.
    pub fn is_ranked(self) -> bool {
        matches!(
            self,
            ValueType::Resolution
                | ValueType::VideoCodec
                | ValueType::AudioCodec
                | ValueType::Channels
        )
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValueType::Text => "text",
            ValueType::List => "list",
            ValueType::Number => "number",
            ValueType::Year => "year",
            ValueType::Date => "date",
            ValueType::Identifier => "identifier",
            ValueType::ImageUrl => "image_url",
            ValueType::Resolution => "resolution",
            ValueType::VideoCodec => "video_codec",
            ValueType::AudioCodec => "audio_codec",
            ValueType::Channels => "channels",
            ValueType::Bitrate => "bitrate",
            ValueType::FileSize => "file_size",
            ValueType::Language => "language",
            ValueType::Subtitles => "subtitles",
        };
        f.write_str(s)
    }
}

/// Whether a normalizer understood its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    /// Input was passed through (trimmed) because it could not be parsed.
    Unparsed,
    /// Input was recognized and rewritten into canonical form.
    Parsed,
}

/// Output of a normalizer. An empty `value` means "no candidate".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Normalized {
    pub value: String,
    pub quality: Quality,
}

impl Normalized {
    pub fn parsed(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            quality: Quality::Parsed,
        }
    }

    pub fn unparsed(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            quality: Quality::Unparsed,
        }
    }

    pub fn empty() -> Self {
        Self::parsed(String::new())
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn is_parsed(&self) -> bool {
        self.quality == Quality::Parsed
    }
}

/// Normalize `raw` as a value of type `value_type`.
pub fn normalize_value(value_type: ValueType, raw: &RawValue) -> Normalized {
    if raw.is_empty() {
        return Normalized::empty();
    }

    match value_type {
        ValueType::Text => text::normalize_text(raw),
        ValueType::List => text::normalize_list(raw),
        ValueType::Number => text::normalize_number(raw),
        ValueType::Year => text::normalize_year(raw),
        ValueType::Identifier => text::normalize_identifier(raw),
        ValueType::ImageUrl => text::normalize_image_url(raw),
        ValueType::Date => date::normalize_date(raw),
        ValueType::Resolution => technical::normalize_resolution(raw),
        ValueType::VideoCodec => technical::normalize_video_codec(raw),
        ValueType::AudioCodec => technical::normalize_audio_codec(raw),
        ValueType::Channels => technical::normalize_channels(raw),
        ValueType::Bitrate => technical::normalize_bitrate(raw),
        ValueType::FileSize => technical::normalize_file_size(raw),
        ValueType::Language => language::normalize_language(raw),
        ValueType::Subtitles => language::normalize_subtitles(raw),
    }
}

/// Collapse runs of whitespace to single spaces and trim.
pub(crate) fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_TYPES: [ValueType; 15] = [
        ValueType::Text,
        ValueType::List,
        ValueType::Number,
        ValueType::Year,
        ValueType::Date,
        ValueType::Identifier,
        ValueType::ImageUrl,
        ValueType::Resolution,
        ValueType::VideoCodec,
        ValueType::AudioCodec,
        ValueType::Channels,
        ValueType::Bitrate,
        ValueType::FileSize,
        ValueType::Language,
        ValueType::Subtitles,
    ];

    #[test]
    fn test_empty_input_is_empty_for_every_type() {
        for ty in ALL_TYPES {
            assert!(normalize_value(ty, &RawValue::Null).is_empty(), "{ty}");
            assert!(normalize_value(ty, &RawValue::from("  ")).is_empty(), "{ty}");
        }
    }

    #[test]
    fn test_normalizers_are_idempotent() {
        let samples = [
            (ValueType::Text, "<p>A  man   wakes up.</p>"),
            (ValueType::Text, "Tom &amp;lt;b&amp;gt; Jerry"),
            (ValueType::Text, "&lt;i&gt;Lost&lt;/i&gt; &amp;amp; found"),
            (ValueType::List, "Drama; comedy | Sci-Fi"),
            (ValueType::Number, "S01"),
            (ValueType::Year, "Released 2004"),
            (ValueType::Date, "22 Sep 2004"),
            (ValueType::Date, "sometime in spring"),
            (ValueType::Identifier, " tt0411008 "),
            (ValueType::ImageUrl, "/abc.jpg"),
            (ValueType::Resolution, "1920x1080"),
            (ValueType::Resolution, "potato"),
            (ValueType::VideoCodec, "HEVC"),
            (ValueType::VideoCodec, "weird-codec"),
            (ValueType::AudioCodec, "E-AC-3"),
            (ValueType::Channels, "6"),
            (ValueType::Channels, "3"),
            (ValueType::Bitrate, "8500 kb/s"),
            (ValueType::Bitrate, "640000 bps"),
            (ValueType::FileSize, "4500 MB"),
            (ValueType::FileSize, "734003200 B"),
            (ValueType::Language, "eng"),
            (ValueType::Language, "xx"),
            (ValueType::Subtitles, "internal and external"),
        ];

        for (ty, input) in samples {
            let once = normalize_value(ty, &RawValue::from(input));
            let twice = normalize_value(ty, &RawValue::from(once.value.as_str()));
            assert_eq!(once.value, twice.value, "{ty} not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_ranked_types() {
        assert!(ValueType::Resolution.is_ranked());
        assert!(!ValueType::Text.is_ranked());
        assert_eq!(ValueType::Text.rank("anything"), 0);
        assert!(ValueType::Resolution.rank("1080p") > ValueType::Resolution.rank("720p"));
    }
}
