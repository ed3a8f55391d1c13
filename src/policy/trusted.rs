//! Image hosts trusted per content origin.
//!
//! Artwork scraped from the storefront an item came from is better than any
//! database poster, so the image guard refuses to replace it. The origin is
//! whatever the canonical `source` field says (`"Amazon"`, `"HBO Max"`, ...).

use std::collections::BTreeMap;

use crate::normalize::text::url_host;

/// Trusted image domains keyed by lower-case origin word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedDomains {
    by_source: BTreeMap<String, Vec<String>>,
}

impl Default for TrustedDomains {
    fn default() -> Self {
        let mut domains = Self::empty();
        domains.set(
            "amazon",
            ["amazon.com", "images-amazon.com", "media-amazon.com", "ssl-images-amazon.com"],
        );
        domains.set("netflix", ["netflix.com", "nflxext.com", "nflximg.net"]);
        domains.set("hulu", ["hulu.com", "hulustream.com"]);
        domains.set("hbo", ["hbo.com", "hbomax.com", "max.com"]);
        domains.set("max", ["hbo.com", "hbomax.com", "max.com"]);
        domains.set("youtube", ["youtube.com", "ytimg.com"]);
        domains
    }
}

impl TrustedDomains {
    pub fn empty() -> Self {
        Self {
            by_source: BTreeMap::new(),
        }
    }

    /// Replace the domain list for `source`.
    pub fn set<I, S>(&mut self, source: &str, domains: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.by_source.insert(
            source.trim().to_ascii_lowercase(),
            domains
                .into_iter()
                .map(|d| d.as_ref().trim().trim_start_matches('.').to_ascii_lowercase())
                .filter(|d| !d.is_empty())
                .collect(),
        );
    }

    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.by_source.keys().map(String::as_str)
    }

    /// Domains trusted for an origin such as `"Amazon Prime"`.
    ///
    /// Every word of the origin is looked up, so `"HBO Max"` picks up both
    /// the `hbo` and `max` entries.
    fn domains_for(&self, origin: &str) -> Vec<&str> {
        let lower = origin.to_ascii_lowercase();
        let mut out = Vec::new();
        for word in lower
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            if let Some(domains) = self.by_source.get(word) {
                out.extend(domains.iter().map(String::as_str));
            }
        }
        out
    }

    /// Whether `url` is hosted on a domain trusted for `origin`.
    ///
    /// A host matches a domain exactly or as a subdomain of it.
    pub fn is_trusted(&self, origin: &str, url: &str) -> bool {
        let Some(host) = url_host(url) else {
            return false;
        };
        self.domains_for(origin)
            .into_iter()
            .any(|domain| host == domain || host.ends_with(&format!(".{domain}")))
    }
}
