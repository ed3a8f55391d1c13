//! Technical stream properties: resolution, codecs, channels, bitrate, size.
//!
//! Ordered types (resolution, codecs, channels) also expose a rank function so
//! the ranked-quality merge strategy can compare canonical values.

use std::sync::LazyLock;

use regex::Regex;

use super::{collapse_whitespace, Normalized};
use crate::source::RawValue;

static DIMENSIONS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d{3,5})\s*[x×]\s*(\d{3,5})").expect("dimensions regex is valid")
});

static SCAN_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d{3,4})\s*[pi]\b").expect("scan regex is valid"));

static QUANTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d[\d,\s]*(?:\.\d+)?)\s*([A-Za-z/]*)").expect("quantity regex is valid")
});

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Canonical resolutions, best first.
pub const RESOLUTIONS: [&str; 6] = ["2160p", "1080p", "720p", "576p", "480p", "SD"];

/// Normalize a resolution from a height, `WxH` dimensions, or a token.
///
/// Anything unrecognized becomes `SD` with [`Quality::Unparsed`](super::Quality).
pub fn normalize_resolution(raw: &RawValue) -> Normalized {
    let text = raw.to_text();
    let lower = text.trim().to_ascii_lowercase();

    if let Some(caps) = DIMENSIONS.captures(&lower) {
        let width: u32 = caps[1].parse().unwrap_or(0);
        let height: u32 = caps[2].parse().unwrap_or(0);
        return Normalized::parsed(from_dimensions(width, height));
    }

    if let Some(caps) = SCAN_LINES.captures(&lower) {
        let height: u32 = caps[1].parse().unwrap_or(0);
        return Normalized::parsed(from_height(height));
    }

    if let Ok(height) = lower.parse::<u32>() {
        return Normalized::parsed(from_height(height));
    }

    let words: Vec<&str> = lower
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    if words.iter().any(|w| matches!(*w, "4k" | "uhd" | "2160")) {
        return Normalized::parsed("2160p");
    }
    if words.iter().any(|w| matches!(*w, "fhd" | "1080")) {
        return Normalized::parsed("1080p");
    }
    if words.iter().any(|w| matches!(*w, "hd" | "720")) {
        return Normalized::parsed("720p");
    }
    if words.contains(&"sd") {
        return Normalized::parsed("SD");
    }

    Normalized::unparsed("SD")
}

fn from_height(height: u32) -> &'static str {
    match height {
        h if h >= 2000 => "2160p",
        h if h >= 1000 => "1080p",
        h if h >= 700 => "720p",
        h if h >= 560 => "576p",
        h if h >= 460 => "480p",
        _ => "SD",
    }
}

/// Widescreen encodes crop the height, so width decides as well.
fn from_dimensions(width: u32, height: u32) -> &'static str {
    let by_width = match width {
        w if w >= 3200 => "2160p",
        w if w >= 1800 => "1080p",
        w if w >= 1200 => "720p",
        _ => "SD",
    };
    let by_height = from_height(height);
    if resolution_rank(by_width) >= resolution_rank(by_height) {
        by_width
    } else {
        by_height
    }
}

/// SD=0, 480p=1, 576p=2, 720p=3, 1080p=4, 2160p=5.
pub fn resolution_rank(value: &str) -> u32 {
    RESOLUTIONS
        .iter()
        .position(|r| r.eq_ignore_ascii_case(value))
        .map(|i| (RESOLUTIONS.len() - 1 - i) as u32)
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Codecs
// ---------------------------------------------------------------------------

/// Uppercase with separators removed: `"E-AC-3"` and `"e ac3"` both become
/// `"EAC3"`.
fn codec_key(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, '-' | '.' | ' ' | '_' | ':' | '/'))
        .flat_map(char::to_uppercase)
        .collect()
}

/// Normalize a video codec name through the alias table.
pub fn normalize_video_codec(raw: &RawValue) -> Normalized {
    let text = collapse_whitespace(&raw.to_text());
    let key = codec_key(&text);

    let canonical = match key.as_str() {
        "AV1" | "AV01" => Some("AV1"),
        "HEVC" | "H265" | "X265" | "HVC1" | "HEV1" => Some("H265"),
        "VP9" | "VP09" => Some("VP9"),
        "AVC" | "AVC1" | "H264" | "X264" => Some("H264"),
        "VC1" | "WVC1" => Some("VC1"),
        "MPEG4" | "MPEG4VISUAL" | "XVID" | "DIVX" | "MP4V" => Some("MPEG4"),
        "MPEG2" | "MPEG2VIDEO" | "MPEGVIDEO" => Some("MPEG2"),
        _ => None,
    };

    match canonical {
        Some(c) => Normalized::parsed(c),
        None => Normalized::unparsed(text.to_uppercase()),
    }
}

/// Efficiency order: AV1 > H265 > VP9 > H264 > VC1/MPEG4 > MPEG2 > unknown.
pub fn video_codec_rank(value: &str) -> u32 {
    match value {
        "AV1" => 6,
        "H265" => 5,
        "VP9" => 4,
        "H264" => 3,
        "VC1" | "MPEG4" => 2,
        "MPEG2" => 1,
        _ => 0,
    }
}

/// Normalize an audio codec name through the alias table.
pub fn normalize_audio_codec(raw: &RawValue) -> Normalized {
    let text = collapse_whitespace(&raw.to_text());
    let key = codec_key(&text);

    // Prefix checks run most specific first: "DTSHDMA" must not match "DTS".
    let canonical = if key.starts_with("TRUEHD") || key == "MLP" {
        Some("TrueHD")
    } else if key.starts_with("DTSX") {
        Some("DTSX")
    } else if key.starts_with("DTSHD") {
        Some("DTSHD")
    } else if key.starts_with("DTS") {
        Some("DTS")
    } else if key.starts_with("EAC3") || key.starts_with("DDP") || key.starts_with("DD+") {
        Some("EAC3")
    } else if key.starts_with("AC3") || key == "DD" {
        Some("AC3")
    } else if key.starts_with("AAC") {
        Some("AAC")
    } else if key == "FLAC" {
        Some("FLAC")
    } else if key.starts_with("PCM") || key == "LPCM" {
        Some("PCM")
    } else if key == "OPUS" {
        Some("OPUS")
    } else if key == "VORBIS" {
        Some("VORBIS")
    } else if key == "MP3" || key == "MPEGAUDIO" {
        Some("MP3")
    } else {
        None
    };

    match canonical {
        Some(c) => Normalized::parsed(c),
        None => Normalized::unparsed(text.to_uppercase()),
    }
}

/// Lossless and object formats first, then lossy by typical bitrate.
pub fn audio_codec_rank(value: &str) -> u32 {
    match value {
        "TrueHD" | "DTSX" => 8,
        "DTSHD" => 7,
        "FLAC" | "PCM" => 6,
        "DTS" => 5,
        "EAC3" => 4,
        "AC3" => 3,
        "AAC" | "OPUS" => 2,
        "VORBIS" | "MP3" => 1,
        _ => 0,
    }
}

// ---------------------------------------------------------------------------
// Channels
// ---------------------------------------------------------------------------

/// Normalize a channel count (`6`, `"5.1"`, `"stereo"`, `"8 channels"`).
pub fn normalize_channels(raw: &RawValue) -> Normalized {
    let text = collapse_whitespace(&raw.to_text());
    match channel_count(&text) {
        Some(n) if n > 0 => Normalized::parsed(channel_layout(n)),
        _ => Normalized::unparsed(text),
    }
}

fn channel_count(text: &str) -> Option<u32> {
    let lower = text.to_ascii_lowercase();
    match lower.as_str() {
        "mono" => return Some(1),
        "stereo" => return Some(2),
        _ => {}
    }

    // "5.1" style layouts: main channels plus LFE.
    if let Some((main, lfe)) = lower.split_once('.') {
        if let (Ok(main), Ok(lfe)) = (main.trim().parse::<u32>(), lfe.trim().parse::<u32>()) {
            return Some(main + lfe);
        }
    }

    // "<n>ch", "<n> channels", bare "<n>".
    let digits: String = lower.chars().take_while(|c| c.is_ascii_digit()).collect();
    let rest = lower[digits.len()..].trim();
    if digits.is_empty() || !(rest.is_empty() || rest.starts_with("ch")) {
        return None;
    }
    digits.parse().ok()
}

fn channel_layout(n: u32) -> String {
    match n {
        1 => "Mono".to_string(),
        2 => "Stereo".to_string(),
        6 => "5.1".to_string(),
        8 => "7.1".to_string(),
        n => format!("{n}ch"),
    }
}

/// Rank is the channel count.
pub fn channels_rank(value: &str) -> u32 {
    channel_count(value).unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Bitrate and size
// ---------------------------------------------------------------------------

/// Split `"8 500 kb/s"` into `(8500.0, "kb/s")`.
fn parse_quantity(text: &str) -> Option<(f64, String)> {
    let caps = QUANTITY.captures(text)?;
    let number: String = caps[1]
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let value = number.parse::<f64>().ok()?;
    Some((value, caps[2].to_ascii_lowercase()))
}

/// Normalize a bitrate. Unitless numbers are kbps.
///
/// Above 2500 kbps the value is written in Mbps with two decimals, otherwise
/// as whole kbps.
pub fn normalize_bitrate(raw: &RawValue) -> Normalized {
    let text = collapse_whitespace(&raw.to_text());
    let Some((value, unit)) = parse_quantity(&text) else {
        return Normalized::unparsed(text);
    };

    let kbps = match unit.as_str() {
        "" | "k" | "kbps" | "kb/s" | "kbit/s" | "kbits" => value,
        "b" | "bps" | "b/s" | "bit/s" | "bits" => value / 1000.0,
        "m" | "mbps" | "mb/s" | "mbit/s" | "mbits" => value * 1000.0,
        _ => return Normalized::unparsed(text),
    };

    if kbps > 2500.0 {
        Normalized::parsed(format!("{:.2} Mbps", kbps / 1000.0))
    } else {
        Normalized::parsed(format!("{} kbps", kbps.round() as u64))
    }
}

/// Normalize a file size. Unitless numbers are megabytes.
///
/// Above 2048 MB the value is written in GB, otherwise MB, one decimal each.
pub fn normalize_file_size(raw: &RawValue) -> Normalized {
    let text = collapse_whitespace(&raw.to_text());
    let Some((value, unit)) = parse_quantity(&text) else {
        return Normalized::unparsed(text);
    };

    let mb = match unit.as_str() {
        "b" | "bytes" => value / (1024.0 * 1024.0),
        "kb" | "kib" => value / 1024.0,
        "" | "mb" | "mib" => value,
        "gb" | "gib" => value * 1024.0,
        "tb" | "tib" => value * 1024.0 * 1024.0,
        _ => return Normalized::unparsed(text),
    };

    if mb > 2048.0 {
        Normalized::parsed(format!("{:.1} GB", mb / 1024.0))
    } else {
        Normalized::parsed(format!("{:.1} MB", mb))
    }
}
