//! Provider-shaped JSON to canonical fields.
//!
//! Each mapper reads one provider's payload with that provider's own field
//! names and fills a [`SourceRecord`] using canonical names. Values stay raw;
//! cleaning (HTML, `N/A`, relative image paths) is the normalizer's job.
//! Mappers never fail: missing or oddly typed fields are simply left out.

use reelmerge_common::{ContentKey, MediaKind, ProviderId};
use serde_json::Value;

use crate::policy::CAST_LIMIT;
use crate::source::{RawValue, SourceRecord};

/// Map a TMDB movie or TV detail response.
///
/// Expects `append_to_response=credits,external_ids`.
pub fn map_tmdb(detail: &Value, kind: MediaKind, key: &ContentKey) -> SourceRecord {
    let mut record = SourceRecord::new(ProviderId::Tmdb, key.clone());

    match kind {
        MediaKind::Movie => {
            record.set("movie", text(detail, "title"));
            record.set("dmovie", text(detail, "overview"));
            record.set("release", text(detail, "release_date"));
            record.set("year", text(detail, "release_date"));
            record.set("imovie", text(detail, "poster_path"));
            record.set("studio", first_name(detail.get("production_companies")));
        }
        MediaKind::Series => {
            record.set("series", text(detail, "name"));
            record.set("dseries", text(detail, "overview"));
            record.set("year", text(detail, "first_air_date"));
            record.set("iseries", text(detail, "poster_path"));
            record.set("network", first_name(detail.get("networks")));
            record.set("studio", first_name(detail.get("production_companies")));
        }
    }

    record.set("genre", names(detail.get("genres"), usize::MAX));
    record.set("cast", names(detail.pointer("/credits/cast"), CAST_LIMIT));
    record.set("tmdb", scalar(detail, "id"));
    record.set(
        "imdb",
        text(detail, "imdb_id").or_else(|| pointer_text(detail, "/external_ids/imdb_id")),
    );
    record.set("tvdb", pointer_scalar(detail, "/external_ids/tvdb_id"));

    record
}

/// Map an OMDb title response (`?i=` or `?t=`).
pub fn map_omdb(detail: &Value, kind: MediaKind, key: &ContentKey) -> SourceRecord {
    let mut record = SourceRecord::new(ProviderId::Omdb, key.clone());

    let (title, desc, image) = match kind {
        MediaKind::Movie => ("movie", "dmovie", "imovie"),
        MediaKind::Series => ("series", "dseries", "iseries"),
    };
    record.set(title, text(detail, "Title"));
    record.set(desc, text(detail, "Plot"));
    record.set(image, text(detail, "Poster"));
    if kind == MediaKind::Movie {
        record.set("release", text(detail, "Released"));
    }

    record.set("year", text(detail, "Year"));
    record.set("studio", text(detail, "Production"));
    record.set("genre", text(detail, "Genre"));
    record.set("rating", text(detail, "Rated"));
    record.set("imdb", text(detail, "imdbID"));

    // OMDb lists actors as one comma-separated string.
    if let Some(actors) = text(detail, "Actors") {
        let top: Vec<String> = actors
            .split(',')
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .take(CAST_LIMIT)
            .map(str::to_string)
            .collect();
        record.set("cast", top);
    }

    record
}

/// Map a TVMaze show object.
pub fn map_tvmaze(show: &Value, key: &ContentKey) -> SourceRecord {
    let mut record = SourceRecord::new(ProviderId::Tvmaze, key.clone());

    record.set("series", text(show, "name"));
    record.set("dseries", text(show, "summary"));
    record.set("year", text(show, "premiered"));
    record.set("genre", strings(show.get("genres")));
    record.set("language", text(show, "language"));
    record.set(
        "network",
        pointer_text(show, "/network/name").or_else(|| pointer_text(show, "/webChannel/name")),
    );
    record.set(
        "iseries",
        pointer_text(show, "/image/original").or_else(|| pointer_text(show, "/image/medium")),
    );
    record.set("tvmaze", scalar(show, "id"));
    record.set("imdb", pointer_text(show, "/externals/imdb"));
    record.set("tvdb", pointer_scalar(show, "/externals/thetvdb"));

    record
}

/// Map a TheTVDB series record (v3 `data` object or v4 extended record).
pub fn map_tvdb(series: &Value, key: &ContentKey) -> SourceRecord {
    let mut record = SourceRecord::new(ProviderId::Tvdb, key.clone());

    record.set(
        "series",
        text(series, "seriesName").or_else(|| text(series, "name")),
    );
    record.set("dseries", text(series, "overview"));
    record.set(
        "year",
        text(series, "firstAired").or_else(|| text(series, "year")),
    );
    record.set(
        "network",
        text(series, "network").or_else(|| pointer_text(series, "/originalNetwork/name")),
    );
    record.set("rating", text(series, "rating"));
    record.set("iseries", text(series, "image").or_else(|| text(series, "poster")));
    record.set("tvdb", scalar(series, "id"));
    record.set("imdb", text(series, "imdbId"));

    // v3 lists genres as strings, v4 as {id, name} objects.
    let genres = match series.get("genre").or_else(|| series.get("genres")) {
        Some(list @ Value::Array(items)) if items.iter().all(Value::is_string) => {
            strings(Some(list))
        }
        other => names(other, usize::MAX),
    };
    record.set("genre", genres);

    record
}

// ---------------------------------------------------------------------------
// JSON helpers
// ---------------------------------------------------------------------------

/// Non-blank string at `key`. OMDb's `"N/A"` counts as blank.
fn text(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(as_text)
}

fn pointer_text(value: &Value, pointer: &str) -> Option<String> {
    value.pointer(pointer).and_then(as_text)
}

fn as_text(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != "N/A")
        .map(str::to_string)
}

/// String or number at `key`, as a raw value.
fn scalar(value: &Value, key: &str) -> RawValue {
    value.get(key).map(to_raw).unwrap_or(RawValue::Null)
}

fn pointer_scalar(value: &Value, pointer: &str) -> RawValue {
    value.pointer(pointer).map(to_raw).unwrap_or(RawValue::Null)
}

fn to_raw(value: &Value) -> RawValue {
    match value {
        Value::Number(n) => n.as_i64().map(RawValue::Integer).unwrap_or(RawValue::Null),
        Value::String(_) => as_text(value).into(),
        _ => RawValue::Null,
    }
}

/// `name` of each object in an array, up to `limit`.
fn names(value: Option<&Value>, limit: usize) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| text(item, "name"))
                .take(limit)
                .collect()
        })
        .unwrap_or_default()
}

fn first_name(value: Option<&Value>) -> Option<String> {
    names(value, 1).into_iter().next()
}

fn strings(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(as_text).collect())
        .unwrap_or_default()
}
