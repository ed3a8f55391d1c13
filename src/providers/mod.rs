//! Source fetchers: thin adapters that turn provider responses into
//! [`SourceRecord`](crate::source::SourceRecord)s.
//!
//! # Module layout
//!
//! - [`fetcher`] -- The [`SourceFetcher`] trait and [`FetchRequest`].
//! - [`registry`] -- Fans a request out to every available fetcher.
//! - [`http`] -- Rate-limited HTTP client shared by the network adapters.
//! - [`mapping`] -- Pure JSON-to-field mappers per provider.
//! - [`tmdb`], [`omdb`], [`tvmaze`] -- Network adapters.
//! - [`static_fetcher`] -- Replays pre-fetched records.

pub mod fetcher;
pub mod http;
pub mod mapping;
pub mod omdb;
pub mod registry;
pub mod static_fetcher;
pub mod tmdb;
pub mod tvmaze;

pub use fetcher::{FetchRequest, SourceFetcher};
pub use omdb::OmdbFetcher;
pub use registry::FetcherRegistry;
pub use static_fetcher::StaticFetcher;
pub use tmdb::TmdbFetcher;
pub use tvmaze::TvmazeFetcher;
