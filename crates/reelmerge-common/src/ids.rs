//! Typed identifiers.
//!
//! A [`ContentKey`] names one physical episode or movie file by its content
//! checksum. It is the join key across every provider and the store, so it is
//! wrapped in a newtype rather than passed around as a bare `String`.

use serde::{Deserialize, Serialize};

/// Content-addressed identifier of one physical media file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentKey(String);

impl ContentKey {
    /// Wrap a checksum (or any other opaque content identifier).
    #[must_use]
    pub fn new<S: Into<String>>(key: S) -> Self {
        Self(key.into())
    }

    /// Borrow the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ContentKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for ContentKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl AsRef<str> for ContentKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_key_display() {
        let key = ContentKey::new("d41d8cd98f00b204");
        assert_eq!(key.to_string(), "d41d8cd98f00b204");
        assert_eq!(key.as_str(), "d41d8cd98f00b204");
    }

    #[test]
    fn test_content_key_serde_transparent() {
        let key = ContentKey::from("abc");
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"abc\"");

        let back: ContentKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }

    #[test]
    fn test_content_key_ordering() {
        let mut keys = vec![ContentKey::from("b"), ContentKey::from("a")];
        keys.sort();
        assert_eq!(keys[0].as_str(), "a");
    }
}
