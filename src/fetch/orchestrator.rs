//! The `Fetcher`: sequential request orchestration.
//!
//! Every public operation runs the same linear sequence: read the cache
//! (GET only), wait out the inter-request delay, issue the request through
//! the browser-profiled client, then classify the response. Failures never
//! escape as panics or raw transport errors; callers get a typed
//! [`FetchError`] and a log event.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Response;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, error, info, instrument, warn};

use crate::cache::ResponseCache;

use super::client::{self, BrowserClient, BrowserProfile, PostBody};
use super::constants::{
    CONNECT_TIMEOUT_SECS, DEFAULT_CACHE_DIR, DEFAULT_CACHE_MAX_AGE, DEFAULT_DELAY_RANGE,
    READ_TIMEOUT_SECS,
};
use super::error::FetchError;
use super::rate_limiter::RateLimiter;

/// Construction-time configuration for a [`Fetcher`].
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Closed `[min, max]` interval for the inter-request delay, in seconds.
    pub delay_range: (f64, f64),

    /// Directory holding cached GET responses.
    pub cache_dir: PathBuf,

    /// Browser identity presented to servers.
    pub profile: BrowserProfile,

    /// HTTP connect timeout in seconds.
    pub connect_timeout_secs: u64,

    /// HTTP read timeout in seconds.
    pub read_timeout_secs: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            delay_range: DEFAULT_DELAY_RANGE,
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            profile: BrowserProfile::default(),
            connect_timeout_secs: CONNECT_TIMEOUT_SECS,
            read_timeout_secs: READ_TIMEOUT_SECS,
        }
    }
}

/// Per-call options for [`Fetcher::get_with`].
#[derive(Debug, Clone)]
pub struct GetOptions {
    /// Query parameters appended to the URL.
    pub params: Vec<(String, String)>,

    /// Whether to read and write the on-disk cache.
    pub use_cache: bool,

    /// Maximum age before a cached response is ignored.
    pub max_cache_age: Duration,
}

impl Default for GetOptions {
    fn default() -> Self {
        Self {
            params: Vec::new(),
            use_cache: true,
            max_cache_age: DEFAULT_CACHE_MAX_AGE,
        }
    }
}

/// Issues rate-limited GET/POST requests and downloads through a
/// browser-profiled HTTP client, with an optional on-disk cache for GET
/// responses.
///
/// Operations are sequential: one instance paces all verbs through a single
/// shared delay clock. Create it once and reuse it so connection pooling
/// and session cookies carry across requests.
///
/// # Example
///
/// ```no_run
/// use fetcher_core::{Fetcher, FetcherConfig};
///
/// # async fn example() -> Result<(), fetcher_core::FetchError> {
/// let fetcher = Fetcher::with_config(FetcherConfig {
///     delay_range: (1.0, 3.0),
///     ..FetcherConfig::default()
/// })?;
///
/// let body = fetcher.get("https://example.com/listing").await?;
/// println!("{} bytes", body.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Fetcher {
    client: BrowserClient,
    limiter: RateLimiter,
    cache: ResponseCache,
}

impl Fetcher {
    /// Creates a fetcher with default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidDelayRange`] if the configured delay
    /// range is invalid (not possible with the defaults, but the
    /// constructor shares [`with_config`](Self::with_config)'s signature).
    pub fn new() -> Result<Self, FetchError> {
        Self::with_config(FetcherConfig::default())
    }

    /// Creates a fetcher from an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidDelayRange`] unless the delay range is
    /// a valid closed interval of non-negative seconds.
    #[instrument(skip(config), fields(cache_dir = %config.cache_dir.display()))]
    pub fn with_config(config: FetcherConfig) -> Result<Self, FetchError> {
        let limiter = RateLimiter::from_range_secs(config.delay_range.0, config.delay_range.1)?;
        let client = BrowserClient::with_profile_and_timeouts(
            config.profile,
            config.connect_timeout_secs,
            config.read_timeout_secs,
        );
        let cache = ResponseCache::new(config.cache_dir);

        debug!("fetcher created");
        Ok(Self {
            client,
            limiter,
            cache,
        })
    }

    /// Returns the response cache backing GET operations.
    #[must_use]
    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Issues a GET request with default options (caching on, 1 hour TTL).
    ///
    /// # Errors
    ///
    /// See [`get_with`](Self::get_with).
    pub async fn get(&self, url: &str) -> Result<String, FetchError> {
        self.get_with(url, &GetOptions::default()).await
    }

    /// Issues a GET request, serving from the cache when possible.
    ///
    /// A cache hit returns immediately: no rate limiting, no network call.
    /// On a miss the request is paced, issued, and a status-200 body is
    /// persisted back to the cache (when `options.use_cache`). A cache
    /// persist failure is logged and does not fail the operation.
    ///
    /// # Errors
    ///
    /// - [`FetchError::HttpStatus`] when the status is not 200
    /// - [`FetchError::Challenge`] when the response is an anti-bot
    ///   challenge page
    /// - [`FetchError::Network`] / [`FetchError::Timeout`] on transport
    ///   failures
    /// - [`FetchError::InvalidUrl`] for a malformed URL
    #[instrument(skip(self, options), fields(url = %url))]
    pub async fn get_with(&self, url: &str, options: &GetOptions) -> Result<String, FetchError> {
        if options.use_cache
            && let Some(cached) = self.cache.read(url, options.max_cache_age).await
        {
            info!("retrieved from cache");
            return Ok(cached);
        }

        self.limiter.acquire().await;
        info!("requesting");

        match self.fetch_text(url, &options.params).await {
            Ok(body) => {
                if options.use_cache
                    && let Err(error) = self.cache.write(url, &body).await
                {
                    warn!(error = %error, "failed to persist response to cache");
                }
                Ok(body)
            }
            Err(error) => {
                log_failure(&error);
                Err(error)
            }
        }
    }

    /// Issues a POST request. Never reads or writes the cache.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`get_with`](Self::get_with).
    #[instrument(skip(self, body), fields(url = %url))]
    pub async fn post(&self, url: &str, body: &PostBody) -> Result<String, FetchError> {
        self.limiter.acquire().await;
        info!("posting");

        match self.post_text(url, body).await {
            Ok(body) => Ok(body),
            Err(error) => {
                log_failure(&error);
                Err(error)
            }
        }
    }

    /// Streams a GET response body to `output_path`, returning bytes written.
    ///
    /// Creates missing parent directories. The body is written through a
    /// buffered writer chunk by chunk, so memory use stays bounded for
    /// large payloads. No caching applies. A partial file left by a
    /// mid-stream failure is removed.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`get_with`](Self::get_with), plus
    /// [`FetchError::Io`] for filesystem failures.
    #[instrument(skip(self), fields(url = %url, path = %output_path.display()))]
    pub async fn download(&self, url: &str, output_path: &Path) -> Result<u64, FetchError> {
        self.limiter.acquire().await;
        info!("downloading file");

        match self.download_inner(url, output_path).await {
            Ok(bytes) => {
                info!(bytes, "download complete");
                Ok(bytes)
            }
            Err(error) => {
                log_failure(&error);
                Err(error)
            }
        }
    }

    /// GET, require status 200, return the body text.
    async fn fetch_text(&self, url: &str, params: &[(String, String)]) -> Result<String, FetchError> {
        let response = self.client.get(url, params).await?;
        let status = response.status().as_u16();

        if status == 200 {
            response
                .text()
                .await
                .map_err(|e| client::transport_error(url, e))
        } else {
            Err(classify_failure(url, response).await)
        }
    }

    /// POST, require status 200, return the body text.
    async fn post_text(&self, url: &str, body: &PostBody) -> Result<String, FetchError> {
        let response = self.client.post(url, body).await?;
        let status = response.status().as_u16();

        if status == 200 {
            response
                .text()
                .await
                .map_err(|e| client::transport_error(url, e))
        } else {
            Err(classify_failure(url, response).await)
        }
    }

    /// Streamed GET to disk shared by [`download`](Self::download).
    async fn download_inner(&self, url: &str, output_path: &Path) -> Result<u64, FetchError> {
        let response = self.client.get(url, &[]).await?;
        let status = response.status().as_u16();

        if status != 200 {
            return Err(classify_failure(url, response).await);
        }

        if let Some(parent) = output_path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| FetchError::io(parent, e))?;
        }

        let mut file = File::create(output_path)
            .await
            .map_err(|e| FetchError::io(output_path, e))?;

        let stream_result = stream_to_file(&mut file, response, url, output_path).await;

        if stream_result.is_err() {
            debug!(path = %output_path.display(), "removing partial file after stream error");
            let _ = tokio::fs::remove_file(output_path).await;
        }

        stream_result
    }
}

/// Streams a response body to a file, returning bytes written.
///
/// Extracted so the caller can clean up the partial file on error.
async fn stream_to_file(
    file: &mut File,
    response: Response,
    url: &str,
    file_path: &Path,
) -> Result<u64, FetchError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| client::transport_error(url, e))?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| FetchError::io(file_path.to_path_buf(), e))?;

        bytes_written += chunk.len() as u64;
    }

    // Ensure all data is flushed to disk
    writer
        .flush()
        .await
        .map_err(|e| FetchError::io(file_path.to_path_buf(), e))?;

    Ok(bytes_written)
}

/// Classifies a non-200 response, consuming its body for challenge markers.
async fn classify_failure(url: &str, response: Response) -> FetchError {
    let status = response.status().as_u16();
    let host = client::response_host(&response);

    if client::is_challenge_headers(&response) {
        return FetchError::challenge(url, host);
    }

    let body = response.text().await.unwrap_or_default();
    if client::is_challenge_body(status, &body) {
        FetchError::challenge(url, host)
    } else {
        FetchError::http_status(url, status)
    }
}

/// Emits the error-path log event, challenges distinctly from the rest.
fn log_failure(error: &FetchError) {
    match error {
        FetchError::Challenge { host, .. } => {
            error!(host = %host, "anti-bot challenge blocked the request");
        }
        FetchError::HttpStatus { status, .. } => {
            error!(status, "request failed with unexpected status");
        }
        _ => error!(error = %error, "request failed"),
    }
}
