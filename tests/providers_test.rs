//! Integration tests for the network fetchers against mock provider APIs.

use std::sync::Arc;

use reelmerge::config::Config;
use reelmerge::providers::{
    FetchRequest, FetcherRegistry, OmdbFetcher, SourceFetcher, TmdbFetcher, TvmazeFetcher,
};
use reelmerge::source::RawValue;
use reelmerge::store::{CanonicalStore, MemoryStore};
use reelmerge::worker::{KeyOutcome, ReconcileJob, ReconcilePass};
use reelmerge_common::{ContentKey, MediaKind, ProviderId};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const KEY: &str = "5d41402abc4b2a76";

fn text(value: &str) -> RawValue {
    RawValue::Text(value.to_string())
}

// ---------------------------------------------------------------------------
// Mock provider APIs
// ---------------------------------------------------------------------------

async fn mount_tmdb(server: &MockServer, searches: u64) {
    Mock::given(method("GET"))
        .and(path("/search/tv"))
        .and(query_param("query", "Lost"))
        .and(query_param("api_key", "tmdb-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                {"id": 1, "name": "Lost Girl", "vote_count": 90000},
                {"id": 4607, "name": "Lost", "vote_count": 4000}
            ]
        })))
        .expect(searches)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/tv/4607"))
        .and(query_param("append_to_response", "credits,external_ids"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 4607,
            "name": "Lost",
            "overview": "Survivors of a plane crash on an island.",
            "first_air_date": "2004-09-22",
            "poster_path": "/lost.jpg",
            "genres": [{"id": 18, "name": "Drama"}, {"id": 9648, "name": "Mystery"}],
            "networks": [{"id": 2, "name": "ABC"}],
            "credits": {"cast": [{"name": "Matthew Fox"}, {"name": "Evangeline Lilly"}]},
            "external_ids": {"imdb_id": "tt0411008", "tvdb_id": 73739}
        })))
        .mount(server)
        .await;
}

async fn mount_tvmaze(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/search/shows"))
        .and(query_param("q", "Lost"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"score": 0.9, "show": {"id": 123, "name": "Lost"}}
        ])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/shows/123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 123,
            "name": "Lost",
            "summary": "<p>After their plane crashes, survivors must cooperate to stay alive.</p>",
            "premiered": "2004-09-22",
            "genres": ["Drama", "Science-Fiction"],
            "language": "English",
            "network": {"name": "ABC"},
            "image": {"original": "https://static.tvmaze.com/uploads/images/original/lost.jpg"},
            "externals": {"imdb": "tt0411008", "thetvdb": 73739}
        })))
        .mount(server)
        .await;
}

async fn mount_omdb(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("s", "Lost"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Search": [{"Title": "Lost", "imdbID": "tt0411008", "Type": "series"}],
            "Response": "True"
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("i", "tt0411008"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Title": "Lost",
            "Year": "2004-2010",
            "Rated": "TV-14",
            "Genre": "Adventure, Drama",
            "Actors": "Matthew Fox, Evangeline Lilly, Josh Holloway",
            "Plot": "N/A",
            "Poster": "N/A",
            "imdbID": "tt0411008",
            "Response": "True"
        })))
        .mount(server)
        .await;
}

// ---------------------------------------------------------------------------
// Individual fetchers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn tmdb_search_then_detail() {
    let server = MockServer::start().await;
    mount_tmdb(&server, 1).await;

    let fetcher = TmdbFetcher::new("tmdb-key", "en-US", 50)
        .unwrap()
        .with_base_url(server.uri());
    let request = FetchRequest::new(KEY, MediaKind::Series).with_title("Lost");

    let record = fetcher.fetch(&request).await.unwrap().unwrap();

    assert_eq!(record.provider, ProviderId::Tmdb);
    assert_eq!(record.content_key, ContentKey::new(KEY));
    assert_eq!(record.get("series"), Some(&text("Lost")));
    assert_eq!(record.get("network"), Some(&text("ABC")));
    assert_eq!(record.get("imdb"), Some(&text("tt0411008")));
    assert_eq!(
        record.get("cast").map(RawValue::to_text).as_deref(),
        Some("Matthew Fox, Evangeline Lilly")
    );
}

#[tokio::test]
async fn tmdb_without_title_skips_lookup() {
    let server = MockServer::start().await;
    let fetcher = TmdbFetcher::new("tmdb-key", "en-US", 50)
        .unwrap()
        .with_base_url(server.uri());

    let record = fetcher
        .fetch(&FetchRequest::new(KEY, MediaKind::Series))
        .await
        .unwrap();

    assert!(record.is_none());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn tvmaze_ignores_movies() {
    let server = MockServer::start().await;
    mount_tvmaze(&server).await;
    let fetcher = TvmazeFetcher::new(50).unwrap().with_base_url(server.uri());

    let movie = FetchRequest::new(KEY, MediaKind::Movie).with_title("Lost");
    assert!(fetcher.fetch(&movie).await.unwrap().is_none());

    let series = FetchRequest::new(KEY, MediaKind::Series).with_title("Lost");
    let record = fetcher.fetch(&series).await.unwrap().unwrap();
    assert_eq!(record.get("tvmaze"), Some(&RawValue::Integer(123)));
}

#[tokio::test]
async fn omdb_not_found_is_a_miss() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Response": "False",
            "Error": "Incorrect IMDb ID."
        })))
        .mount(&server)
        .await;

    let fetcher = OmdbFetcher::new("omdb-key", 50).unwrap().with_base_url(server.uri());
    let request = FetchRequest::new(KEY, MediaKind::Series).with_imdb_id("tt0000000");

    assert!(fetcher.fetch(&request).await.unwrap().is_none());
}

#[tokio::test]
async fn omdb_uses_known_imdb_id() {
    let server = MockServer::start().await;
    mount_omdb(&server).await;

    let fetcher = OmdbFetcher::new("omdb-key", 50).unwrap().with_base_url(server.uri());
    let request = FetchRequest::new(KEY, MediaKind::Series).with_imdb_id("tt0411008");

    let record = fetcher.fetch(&request).await.unwrap().unwrap();
    assert_eq!(record.get("rating"), Some(&text("TV-14")));

    let searched = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .any(|r| r.url.query_pairs().any(|(k, _)| k == "s"));
    assert!(!searched);
}

#[tokio::test]
async fn provider_error_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/tv"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let fetcher = TmdbFetcher::new("tmdb-key", "en-US", 50)
        .unwrap()
        .with_base_url(server.uri());
    let request = FetchRequest::new(KEY, MediaKind::Series).with_title("Lost");

    assert!(fetcher.fetch(&request).await.is_err());
}

// ---------------------------------------------------------------------------
// Registry and full pass
// ---------------------------------------------------------------------------

fn config_for(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.providers.tmdb_api_key = Some("tmdb-key".into());
    config.providers.omdb_api_key = Some("omdb-key".into());
    config.providers.requests_per_second = 50;
    config.providers.tmdb_base_url = Some(server.uri());
    config.providers.omdb_base_url = Some(server.uri());
    config.providers.tvmaze_base_url = Some(server.uri());
    config
}

#[test]
fn registry_skips_keyless_providers() {
    let registry = FetcherRegistry::from_config(&Config::default().providers).unwrap();

    let providers: Vec<ProviderId> = registry.available().iter().map(|f| f.provider()).collect();
    assert_eq!(providers, vec![ProviderId::Tvmaze]);
}

#[tokio::test]
async fn full_pass_merges_all_providers() {
    let server = MockServer::start().await;
    mount_tmdb(&server, 2).await;
    mount_tvmaze(&server).await;
    mount_omdb(&server).await;

    let store = Arc::new(MemoryStore::new());
    let pass = ReconcilePass::from_config(&config_for(&server), store.clone()).unwrap();
    let job = ReconcileJob::new(KEY, MediaKind::Series).with_title("Lost");

    let report = pass.run(vec![job.clone()]).await;
    assert_eq!(report.applied(), 1, "{report:?}");

    let record = store.get(&ContentKey::new(KEY)).unwrap().unwrap();
    assert_eq!(record.get("series"), Some("Lost"));
    assert_eq!(record.source_of("series"), Some(ProviderId::Tmdb));
    assert_eq!(record.get("network"), Some("ABC"));
    assert_eq!(record.get("imdb"), Some("tt0411008"));
    assert_eq!(record.get("rating"), Some("TV-14"));
    assert_eq!(
        record.get("cast"),
        Some("Matthew Fox, Evangeline Lilly, Josh Holloway")
    );
    assert_eq!(
        record.get("iseries"),
        Some("https://image.tmdb.org/t/p/w500/lost.jpg")
    );

    let mut genres: Vec<&str> = record.get("genre").unwrap().split(", ").collect();
    genres.sort_unstable();
    assert_eq!(genres, vec!["Adventure", "Drama", "Mystery", "Science-Fiction"]);

    // The second pass knows the IMDb id, so the request differs and the
    // providers are asked again. The third repeats the second exactly and is
    // answered by the lookup cache; the TMDB search mock expects two calls.
    for _ in 0..2 {
        let report = pass.run(vec![job.clone()]).await;
        assert_matches::assert_matches!(
            report.get(&ContentKey::new(KEY)),
            Some(KeyOutcome::Unchanged)
        );
    }
}
