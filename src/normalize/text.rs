//! Free text, lists, numbers, years, identifiers and image URLs.

use std::sync::LazyLock;

use regex::Regex;

use super::{collapse_whitespace, Normalized};
use crate::source::RawValue;

/// Base for TMDB poster path fragments such as `/abc.jpg`.
pub const TMDB_POSTER_BASE: &str = "https://image.tmdb.org/t/p/w500";

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("html tag regex is valid"));

static YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4})\b").expect("year regex is valid"));

/// OMDB reports missing values as this literal.
fn is_missing(s: &str) -> bool {
    s.eq_ignore_ascii_case("n/a")
}

fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Strip HTML, decode common entities and collapse whitespace.
///
/// Decoding and stripping repeat until nothing changes, so escaped markup
/// such as `&amp;lt;b&amp;gt;` is removed in one call rather than surfacing
/// as a tag on the next.
pub fn clean_text(s: &str) -> String {
    let mut current = s.to_string();
    loop {
        let next = HTML_TAG.replace_all(&decode_entities(&current), "").into_owned();
        if next == current {
            break;
        }
        current = next;
    }
    let cleaned = collapse_whitespace(&current);
    if is_missing(&cleaned) {
        String::new()
    } else {
        cleaned
    }
}

pub fn normalize_text(raw: &RawValue) -> Normalized {
    Normalized::parsed(clean_text(&raw.to_text()))
}

/// Split on `,` `;` `|`, trim, drop blanks and duplicates, join with `", "`.
pub fn normalize_list(raw: &RawValue) -> Normalized {
    let joined = match raw {
        RawValue::List(items) => items.join(","),
        other => other.to_text(),
    };
    Normalized::parsed(join_list(&split_list(&joined)))
}

/// Split a list value into cleaned items, keeping first-seen casing.
pub fn split_list(s: &str) -> Vec<String> {
    let mut items: Vec<String> = Vec::new();
    for part in s.split([',', ';', '|']) {
        let item = clean_text(part);
        if item.is_empty() {
            continue;
        }
        if !items.iter().any(|i| i.eq_ignore_ascii_case(&item)) {
            items.push(item);
        }
    }
    items
}

pub fn join_list(items: &[String]) -> String {
    items.join(", ")
}

/// First run of digits, without leading zeros (`"S01"` is `1`).
pub fn normalize_number(raw: &RawValue) -> Normalized {
    if let RawValue::Float(f) = raw {
        if f.fract() == 0.0 && *f >= 0.0 {
            return Normalized::parsed((*f as u64).to_string());
        }
    }

    let text = collapse_whitespace(&raw.to_text());
    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();

    if digits.is_empty() {
        return Normalized::unparsed(text);
    }

    let trimmed = digits.trim_start_matches('0');
    Normalized::parsed(if trimmed.is_empty() { "0" } else { trimmed })
}

/// First plausible four-digit year (1870 to 2100).
pub fn normalize_year(raw: &RawValue) -> Normalized {
    let text = collapse_whitespace(&raw.to_text());
    let year = YEAR
        .captures_iter(&text)
        .filter_map(|caps| caps[1].parse::<u32>().ok())
        .find(|y| (1870..=2100).contains(y));

    match year {
        Some(y) => Normalized::parsed(y.to_string()),
        None if is_missing(&text) => Normalized::empty(),
        None => Normalized::unparsed(text),
    }
}

/// External identifiers are opaque: trimmed, with OMDB's `N/A` dropped.
pub fn normalize_identifier(raw: &RawValue) -> Normalized {
    let text = raw.to_text();
    let text = text.trim();
    if is_missing(text) {
        Normalized::empty()
    } else {
        Normalized::parsed(text)
    }
}

/// Absolute URLs are kept; TMDB path fragments are expanded.
pub fn normalize_image_url(raw: &RawValue) -> Normalized {
    let text = raw.to_text();
    let url = text.trim();

    if is_missing(url) {
        Normalized::empty()
    } else if url.starts_with("https://") || url.starts_with("http://") {
        Normalized::parsed(url)
    } else if let Some(rest) = url.strip_prefix("//") {
        Normalized::parsed(format!("https://{rest}"))
    } else if url.starts_with('/') {
        Normalized::parsed(format!("{TMDB_POSTER_BASE}{url}"))
    } else {
        Normalized::unparsed(url)
    }
}

/// Host part of an absolute http(s) URL, lower-cased, without port or
/// credentials. Parsed the way browsers parse it, so `\` separators and
/// userinfo cannot smuggle in a different host.
pub fn url_host(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url.trim()).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    let host = parsed.host_str()?.trim_end_matches('.');
    if host.is_empty() {
        None
    } else {
        Some(host.to_ascii_lowercase())
    }
}
