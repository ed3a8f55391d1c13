//! Trait definition and request type for source fetchers.

use async_trait::async_trait;
use reelmerge_common::{ContentKey, MediaKind, ProviderId};
use serde::{Deserialize, Serialize};

use crate::source::SourceRecord;

/// What a fetcher needs to look one item up.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FetchRequest {
    /// Key the resulting [`SourceRecord`] is filed under.
    pub content_key: ContentKey,
    /// Title to search for, for providers that only search by name.
    pub title: Option<String>,
    pub kind: MediaKind,
    /// IMDb id, when an earlier pass already knows it.
    pub imdb_id: Option<String>,
}

impl FetchRequest {
    pub fn new(content_key: impl Into<ContentKey>, kind: MediaKind) -> Self {
        Self {
            content_key: content_key.into(),
            title: None,
            kind,
            imdb_id: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        let title = title.into();
        self.title = (!title.trim().is_empty()).then_some(title);
        self
    }

    pub fn with_imdb_id(mut self, imdb_id: impl Into<String>) -> Self {
        let imdb_id = imdb_id.into();
        self.imdb_id = (!imdb_id.trim().is_empty()).then_some(imdb_id);
        self
    }
}

/// Async trait every metadata source implements.
///
/// A fetcher turns one [`FetchRequest`] into at most one [`SourceRecord`]
/// using canonical field names. `Ok(None)` means the provider has nothing for
/// the item; `Err` means it could not be asked (network, auth, bad payload).
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Which provider the records are attributed to.
    fn provider(&self) -> ProviderId;

    /// Returns `true` when the fetcher is configured and ready to serve
    /// requests.
    fn is_available(&self) -> bool {
        true
    }

    async fn fetch(&self, request: &FetchRequest) -> anyhow::Result<Option<SourceRecord>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_title_is_none() {
        let req = FetchRequest::new("abc", MediaKind::Series).with_title("  ");
        assert!(req.title.is_none());

        let req = req.with_title("Lost").with_imdb_id("tt0411008");
        assert_eq!(req.title.as_deref(), Some("Lost"));
        assert_eq!(req.imdb_id.as_deref(), Some("tt0411008"));
    }
}
