//! Audio language and subtitle presence.

use super::{collapse_whitespace, Normalized};
use crate::source::RawValue;

/// ISO 639-1 / 639-2 (B and T) codes to display names.
const LANGUAGES: &[(&[&str], &str)] = &[
    (&["en", "eng"], "English"),
    (&["es", "esp", "spa"], "Spanish"),
    (&["fr", "fre", "fra"], "French"),
    (&["de", "ger", "deu"], "German"),
    (&["it", "ita"], "Italian"),
    (&["pt", "por"], "Portuguese"),
    (&["ru", "rus"], "Russian"),
    (&["ja", "jpn"], "Japanese"),
    (&["ko", "kor"], "Korean"),
    (&["zh", "chi", "zho"], "Chinese"),
    (&["nl", "dut", "nld"], "Dutch"),
    (&["sv", "swe"], "Swedish"),
    (&["no", "nor"], "Norwegian"),
    (&["da", "dan"], "Danish"),
    (&["fi", "fin"], "Finnish"),
    (&["pl", "pol"], "Polish"),
    (&["tr", "tur"], "Turkish"),
    (&["ar", "ara"], "Arabic"),
    (&["hi", "hin"], "Hindi"),
];

/// Normalize a language code to its full name.
///
/// Known codes map through the table. Full names are title-cased and count as
/// parsed; unknown short codes are title-cased but unparsed.
pub fn normalize_language(raw: &RawValue) -> Normalized {
    let text = collapse_whitespace(&raw.to_text());
    let lower = text.to_ascii_lowercase();

    if let Some((_, name)) = LANGUAGES.iter().find(|(codes, _)| codes.contains(&lower.as_str())) {
        return Normalized::parsed(*name);
    }

    let titled = title_case(&text);
    if text.len() > 3 && text.chars().all(|c| c.is_alphabetic() || c == ' ') {
        Normalized::parsed(titled)
    } else {
        Normalized::unparsed(titled)
    }
}

fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ---------------------------------------------------------------------------
// Subtitles
// ---------------------------------------------------------------------------

/// Where subtitles are available for an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SubtitlePresence {
    pub internal: bool,
    pub external: bool,
}

impl SubtitlePresence {
    pub fn new(internal: bool, external: bool) -> Self {
        Self { internal, external }
    }

    /// Parse a canonical or loosely written presence value.
    pub fn parse(text: &str) -> Option<Self> {
        let lower = collapse_whitespace(&text.to_ascii_lowercase());
        match lower.as_str() {
            "none" | "no" | "false" | "0" => Some(Self::new(false, false)),
            "internal" | "embedded" | "true" | "yes" => Some(Self::new(true, false)),
            "external" | "sidecar" => Some(Self::new(false, true)),
            "internal & external" | "internal and external" | "both" => {
                Some(Self::new(true, true))
            }
            _ => None,
        }
    }

    /// Flags present in either value.
    pub fn union(self, other: Self) -> Self {
        Self::new(self.internal || other.internal, self.external || other.external)
    }

    pub fn as_str(self) -> &'static str {
        match (self.internal, self.external) {
            (false, false) => "None",
            (true, false) => "Internal",
            (false, true) => "External",
            (true, true) => "Internal & External",
        }
    }
}

/// Normalize subtitle presence.
///
/// A boolean means "an internal track was found"; integers are internal
/// track counts.
pub fn normalize_subtitles(raw: &RawValue) -> Normalized {
    let presence = match raw {
        RawValue::Bool(internal) => Some(SubtitlePresence::new(*internal, false)),
        RawValue::Integer(count) => Some(SubtitlePresence::new(*count > 0, false)),
        other => SubtitlePresence::parse(&other.to_text()),
    };

    match presence {
        Some(p) => Normalized::parsed(p.as_str()),
        None => Normalized::unparsed(collapse_whitespace(&raw.to_text())),
    }
}
