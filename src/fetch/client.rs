//! Browser-profiled HTTP client wrapper.
//!
//! This module provides the `BrowserClient` struct: a `reqwest::Client`
//! configured to present itself as a desktop browser (User-Agent plus
//! navigation headers) with a persistent session cookie jar, so clearance
//! cookies handed out after a passed challenge keep working for the rest of
//! the process. It also classifies responses that are anti-bot challenge
//! pages rather than content.
//!
//! Classification is a heuristic over status codes, Cloudflare response
//! headers, and well-known challenge page markers. It detects challenges;
//! it does not solve them.

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use reqwest::{Client, Response};
use tracing::{debug, instrument};
use url::Url;

use super::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use super::error::FetchError;

/// Response statuses under which a challenge page may be served.
const CHALLENGE_STATUSES: &[u16] = &[403, 503];

/// Body fragments that identify well-known challenge pages (lowercase).
const CHALLENGE_BODY_MARKERS: &[&str] = &[
    "just a moment",
    "checking your browser",
    "cf-chl",
    "challenge-platform",
    "ddos protection by",
];

/// Browser identity presented to servers.
///
/// Selects the User-Agent and navigation headers attached to every request,
/// mirroring what the named browser sends on a top-level page load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BrowserProfile {
    /// Desktop Chrome on macOS.
    #[default]
    Chrome,
    /// Desktop Firefox on Windows.
    Firefox,
}

impl BrowserProfile {
    /// Returns the profile's User-Agent string.
    #[must_use]
    pub fn user_agent(self) -> &'static str {
        match self {
            Self::Chrome => {
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
                 AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36"
            }
            Self::Firefox => {
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) \
                 Gecko/20100101 Firefox/133.0"
            }
        }
    }

    /// Returns the navigation headers the profile sends with page loads.
    fn navigation_headers(self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
            ),
        );
        let language = match self {
            Self::Chrome => "en-US,en;q=0.9",
            Self::Firefox => "en-US,en;q=0.5",
        };
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(language));
        headers
    }
}

/// Request body for POST operations.
#[derive(Debug, Clone)]
pub enum PostBody {
    /// No request body.
    Empty,
    /// URL-encoded form fields.
    Form(Vec<(String, String)>),
    /// JSON payload.
    Json(serde_json::Value),
}

/// HTTP client presenting a browser identity, reused across requests.
///
/// Built once per `Fetcher` to keep connection pooling and the session
/// cookie jar, matching how a browser holds one session across a site.
#[derive(Debug, Clone)]
pub struct BrowserClient {
    client: Client,
}

impl Default for BrowserClient {
    fn default() -> Self {
        Self::new()
    }
}

impl BrowserClient {
    /// Creates a client with the default Chrome profile and timeouts.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    pub fn new() -> Self {
        Self::with_profile(BrowserProfile::default())
    }

    /// Creates a client with an explicit browser profile.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    pub fn with_profile(profile: BrowserProfile) -> Self {
        Self::with_profile_and_timeouts(profile, CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }

    /// Creates a client with an explicit profile and timeout values.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the supplied
    /// configuration.
    #[must_use]
    #[allow(clippy::expect_used)]
    #[instrument(level = "debug")]
    pub fn with_profile_and_timeouts(
        profile: BrowserProfile,
        connect_timeout_secs: u64,
        read_timeout_secs: u64,
    ) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .timeout(Duration::from_secs(read_timeout_secs))
            .gzip(true)
            .user_agent(profile.user_agent())
            .default_headers(profile.navigation_headers())
            .cookie_provider(Arc::new(Jar::default()))
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self { client }
    }

    /// Issues a GET request with optional query parameters.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidUrl`] for a malformed URL,
    /// [`FetchError::Timeout`] when the request times out, and
    /// [`FetchError::Network`] for any other transport failure.
    pub async fn get(
        &self,
        url: &str,
        params: &[(String, String)],
    ) -> Result<Response, FetchError> {
        Url::parse(url).map_err(|_| FetchError::invalid_url(url))?;

        let mut request = self.client.get(url);
        if !params.is_empty() {
            request = request.query(params);
        }

        debug!(params = params.len(), "sending GET");
        request.send().await.map_err(|e| transport_error(url, e))
    }

    /// Issues a POST request with the given body.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`get`](Self::get).
    pub async fn post(&self, url: &str, body: &PostBody) -> Result<Response, FetchError> {
        Url::parse(url).map_err(|_| FetchError::invalid_url(url))?;

        let request = match body {
            PostBody::Empty => self.client.post(url),
            PostBody::Form(fields) => self.client.post(url).form(fields),
            PostBody::Json(value) => self.client.post(url).json(value),
        };

        debug!("sending POST");
        request.send().await.map_err(|e| transport_error(url, e))
    }

    /// Returns a reference to the underlying reqwest client.
    ///
    /// This can be used for advanced operations not covered by this wrapper.
    #[must_use]
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

/// Maps a reqwest transport failure onto the error taxonomy.
pub(crate) fn transport_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::timeout(url)
    } else {
        FetchError::network(url, error)
    }
}

/// Returns true if the response headers identify a challenge interception.
///
/// Usable before the body is consumed, so streamed downloads can classify
/// without buffering. Looks for Cloudflare's `cf-mitigated: challenge`
/// marker on a 403/503, or the classic 503-from-cloudflare interstitial.
#[must_use]
pub fn is_challenge_headers(response: &Response) -> bool {
    let status = response.status().as_u16();
    if !CHALLENGE_STATUSES.contains(&status) {
        return false;
    }

    let header_contains = |name: &str, needle: &str| {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.to_ascii_lowercase().contains(needle))
    };

    header_contains("cf-mitigated", "challenge")
        || (status == 503 && header_contains("server", "cloudflare"))
}

/// Returns true if a buffered body under the given status reads as a
/// challenge page.
#[must_use]
pub fn is_challenge_body(status: u16, body: &str) -> bool {
    if !CHALLENGE_STATUSES.contains(&status) {
        return false;
    }
    let lowered = body.to_lowercase();
    CHALLENGE_BODY_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}

/// Lowercased host of a response's final URL, `unknown` when absent.
#[must_use]
pub(crate) fn response_host(response: &Response) -> String {
    response
        .url()
        .host_str()
        .map(str::to_lowercase)
        .unwrap_or_else(|| "unknown".to_string())
}
