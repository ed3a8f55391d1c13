//! Shared HTTP plumbing for provider adapters.
//!
//! Every adapter owns one [`HttpClient`]: a reqwest client with a 30-second
//! timeout behind a token-bucket rate limiter, retrying HTTP 429 responses
//! after the server's `Retry-After` delay.

use std::num::NonZeroU32;
use std::time::Duration;

use anyhow::Context;
use governor::{Quota, RateLimiter};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use reelmerge_common::ProviderId;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_RETRIES: u32 = 3;

type DirectRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Rate-limited JSON client for one provider.
pub struct HttpClient {
    provider: ProviderId,
    client: reqwest::Client,
    rate_limiter: DirectRateLimiter,
}

impl HttpClient {
    /// Build a client allowing `requests_per_second` requests (at least one).
    pub fn new(provider: ProviderId, requests_per_second: u32) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("reelmerge/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;

        let per_second = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = RateLimiter::direct(Quota::per_second(per_second));

        Ok(Self {
            provider,
            client,
            rate_limiter,
        })
    }

    /// Execute a GET request with rate limiting and 429-retry logic.
    pub async fn get(&self, url: &str) -> anyhow::Result<reqwest::Response> {
        let mut retries = 0u32;
        loop {
            self.rate_limiter.until_ready().await;

            let resp = self
                .client
                .get(url)
                .send()
                .await
                .with_context(|| format!("{} request failed", self.provider))?;

            if resp.status() == StatusCode::TOO_MANY_REQUESTS && retries < MAX_RETRIES {
                retries += 1;
                let wait = resp
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.trim().parse::<u64>().ok())
                    .unwrap_or(1);
                warn!(
                    provider = %self.provider,
                    retry = retries,
                    wait_secs = wait,
                    "Provider returned 429, backing off"
                );
                tokio::time::sleep(Duration::from_secs(wait)).await;
                continue;
            }

            let resp = resp
                .error_for_status()
                .with_context(|| format!("{} request returned error", self.provider))?;

            return Ok(resp);
        }
    }

    /// GET and decode a JSON body.
    ///
    /// A 404 is "nothing here", not an error.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> anyhow::Result<Option<T>> {
        debug!(provider = %self.provider, url = %redact(url), "GET");

        match self.get(url).await {
            Ok(resp) => {
                let body = resp
                    .json::<T>()
                    .await
                    .with_context(|| format!("failed to parse {} response", self.provider))?;
                Ok(Some(body))
            }
            Err(e) if is_not_found(&e) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

fn is_not_found(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<reqwest::Error>())
        .any(|e| e.status() == Some(StatusCode::NOT_FOUND))
}

/// Hide API keys before a URL reaches the logs.
pub(crate) fn redact(url: &str) -> String {
    let Some((base, query)) = url.split_once('?') else {
        return url.to_string();
    };

    let params: Vec<String> = query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((key, _)) if key == "api_key" || key == "apikey" => format!("{key}=***"),
            _ => pair.to_string(),
        })
        .collect();

    format!("{base}?{}", params.join("&"))
}

/// Build `base + path` with query parameters, percent-encoding the values.
pub(crate) fn build_url(base: &str, path: &str, params: &[(&str, &str)]) -> String {
    let mut url = format!("{}{}", base.trim_end_matches('/'), path);
    for (i, (key, value)) in params.iter().enumerate() {
        url.push(if i == 0 { '?' } else { '&' });
        url.push_str(key);
        url.push('=');
        url.push_str(&urlencoded(value));
    }
    url
}

/// Minimal percent-encoding for query parameter values.
pub(crate) fn urlencoded(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char);
            }
            b' ' => out.push('+'),
            _ => {
                out.push('%');
                out.push(char::from(HEX[(b >> 4) as usize]));
                out.push(char::from(HEX[(b & 0x0f) as usize]));
            }
        }
    }
    out
}

const HEX: [u8; 16] = *b"0123456789ABCDEF";
