//! Benchmarks for reconciliation
//!
//! Measures normalization, candidate selection and full reconcile passes over
//! realistic provider payloads.

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use reelmerge::normalize::{normalize_value, ValueType};
use reelmerge::policy::PolicyRegistry;
use reelmerge::reconcile;
use reelmerge::select::choose_result;
use reelmerge::source::{RawValue, SourceRecord};
use reelmerge_common::{ContentKey, ProviderId};
use reelmerge_db::models::CanonicalRecord;
use serde_json::{json, Value};

const KEY: &str = "5d41402abc4b2a76";

/// A full set of provider records for one series.
fn provider_records() -> Vec<SourceRecord> {
    vec![
        SourceRecord::new(ProviderId::Tmdb, KEY)
            .with_field("series", "Lost")
            .with_field("dseries", "Survivors of a plane crash on an island.")
            .with_field("year", "2004-09-22")
            .with_field("network", "ABC")
            .with_field("genre", vec!["Drama".to_string(), "Mystery".to_string()])
            .with_field(
                "cast",
                vec![
                    "Matthew Fox".to_string(),
                    "Evangeline Lilly".to_string(),
                    "Josh Holloway".to_string(),
                ],
            )
            .with_field("iseries", "/lost.jpg")
            .with_field("tmdb", 4607i64)
            .with_field("imdb", "tt0411008"),
        SourceRecord::new(ProviderId::Omdb, KEY)
            .with_field("series", "Lost")
            .with_field("year", "2004–2010")
            .with_field("genre", "Adventure, Drama, Fantasy")
            .with_field("rating", "TV-14")
            .with_field("cast", "Matthew Fox, Jorge Garcia, Naveen Andrews")
            .with_field("imdb", "tt0411008"),
        SourceRecord::new(ProviderId::Tvmaze, KEY)
            .with_field("series", "Lost")
            .with_field(
                "dseries",
                "<p>After <b>Oceanic Air flight 815</b> crashes on a mysterious island, \
                 the survivors must cooperate to stay alive.</p>",
            )
            .with_field("network", "ABC")
            .with_field("language", "English")
            .with_field("iseries", "https://static.tvmaze.com/uploads/images/original/lost.jpg"),
        SourceRecord::new(ProviderId::Ffprobe, KEY)
            .with_field("resolution", "1920x1080")
            .with_field("vcodec", "hevc")
            .with_field("acodec", "truehd")
            .with_field("achannels", 8i64)
            .with_field("size", 4_294_967_296i64),
        SourceRecord::new(ProviderId::Mediainfo, KEY)
            .with_field("resolution", "1920x1080")
            .with_field("vcodec", "HEVC")
            .with_field("acodec", "E-AC-3")
            .with_field("vbitrate", "12.5 Mb/s")
            .with_field("subtitles", "eng, spa"),
    ]
}

fn existing_record() -> CanonicalRecord {
    let mut record = CanonicalRecord::new(ContentKey::new(KEY), Utc::now());
    for (field, value) in [
        ("series", "Lost"),
        ("dseries", "A show."),
        ("resolution", "720p"),
        ("genre", "Drama"),
        ("source", "Amazon"),
        ("iseries", "https://m.media-amazon.com/images/lost.jpg"),
    ] {
        record.fields.insert(field.to_string(), value.to_string());
    }
    record
}

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");

    let cases = [
        ("date", ValueType::Date, RawValue::from("22 Sep 2004")),
        ("resolution", ValueType::Resolution, RawValue::from("3840x2160")),
        ("audio_codec", ValueType::AudioCodec, RawValue::from("DTS-HD MA")),
        ("language", ValueType::Language, RawValue::from("eng")),
        (
            "text",
            ValueType::Text,
            RawValue::from("<p>Lost &amp; found on <i>the island</i>.</p>"),
        ),
    ];

    for (name, value_type, raw) in &cases {
        group.bench_with_input(BenchmarkId::new("value", name), raw, |b, raw| {
            b.iter(|| normalize_value(black_box(*value_type), black_box(raw)));
        });
    }

    group.finish();
}

fn bench_choose_result(c: &mut Criterion) {
    let mut group = c.benchmark_group("choose_result");

    for size in [5, 20, 100] {
        let hits: Vec<Value> = (0..size)
            .map(|i| json!({"name": format!("Lost {}", i), "vote_count": i * 37}))
            .chain(std::iter::once(json!({"name": "Lost", "vote_count": 4000})))
            .collect();

        group.bench_with_input(BenchmarkId::new("hits", size), &hits, |b, hits| {
            b.iter(|| choose_result(black_box(hits), black_box("Lost")));
        });
    }

    group.finish();
}

fn bench_reconcile(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile");

    let registry = PolicyRegistry::default();
    let key = ContentKey::new(KEY);
    let records = provider_records();
    let existing = existing_record();

    group.bench_function("new_record", |b| {
        b.iter(|| reconcile(black_box(&registry), &key, None, black_box(&records)));
    });

    group.bench_function("existing_record", |b| {
        b.iter(|| reconcile(black_box(&registry), &key, Some(&existing), black_box(&records)));
    });

    // Repeated fetches of the same providers, as after many passes.
    let stacked: Vec<SourceRecord> = (0..10).flat_map(|_| provider_records()).collect();
    group.bench_function("stacked_fetches", |b| {
        b.iter(|| reconcile(black_box(&registry), &key, Some(&existing), black_box(&stacked)));
    });

    group.finish();
}

criterion_group!(benches, bench_normalize, bench_choose_result, bench_reconcile);
criterion_main!(benches);
