//! Error types for the fetch module.
//!
//! Every public operation returns one of these variants instead of
//! swallowing failures; callers branch on the kind while the full context
//! (URL, status, source error) stays attached.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while issuing requests or writing downloads.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error requesting {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout requesting {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// Response status was not 200.
    ///
    /// Statuses 201-299 land here too: the operations treat exactly 200 as
    /// success, matching the sites these requests target.
    #[error("HTTP {status} requesting {url}")]
    HttpStatus {
        /// The URL that returned the status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The server answered with an anti-bot challenge page instead of content.
    #[error("anti-bot challenge from {host} requesting {url}")]
    Challenge {
        /// The URL that was challenged.
        url: String,
        /// The host serving the challenge.
        host: String,
    },

    /// File system error while writing a download.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The provided URL is malformed or invalid.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// Configured delay range is not a valid closed interval of seconds.
    #[error("invalid delay range [{min}, {max}]: bounds must be finite, non-negative, min <= max")]
    InvalidDelayRange {
        /// Lower bound in seconds.
        min: f64,
        /// Upper bound in seconds.
        max: f64,
    },
}

impl FetchError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a challenge error.
    pub fn challenge(url: impl Into<String>, host: impl Into<String>) -> Self {
        Self::Challenge {
            url: url.into(),
            host: host.into(),
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates an invalid delay range error.
    #[must_use]
    pub fn invalid_delay_range(min: f64, max: f64) -> Self {
        Self::InvalidDelayRange { min, max }
    }
}

// Note on From trait implementations:
// We intentionally do NOT implement `From<reqwest::Error>` or `From<std::io::Error>`
// because the variants require context (url, path) that the source errors
// don't carry. The helper constructors are the pattern here.

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_display() {
        let error = FetchError::timeout("https://example.com/page");
        assert!(error.to_string().contains("timeout"));
        assert!(error.to_string().contains("https://example.com/page"));
    }

    #[test]
    fn test_http_status_display() {
        let error = FetchError::http_status("https://example.com/page", 403);
        let msg = error.to_string();
        assert!(msg.contains("403"), "Expected '403' in: {msg}");
        assert!(
            msg.contains("https://example.com/page"),
            "Expected URL in: {msg}"
        );
    }

    #[test]
    fn test_challenge_display_names_host() {
        let error = FetchError::challenge("https://example.com/listing", "example.com");
        let msg = error.to_string();
        assert!(msg.contains("challenge"), "Expected 'challenge' in: {msg}");
        assert!(msg.contains("example.com"), "Expected host in: {msg}");
    }

    #[test]
    fn test_io_display() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let error = FetchError::io(PathBuf::from("/tmp/out.bin"), io_error);
        let msg = error.to_string();
        assert!(msg.contains("/tmp/out.bin"), "Expected path in: {msg}");
    }

    #[test]
    fn test_invalid_url_display() {
        let error = FetchError::invalid_url("not-a-url");
        let msg = error.to_string();
        assert!(
            msg.contains("invalid URL"),
            "Expected 'invalid URL' in: {msg}"
        );
        assert!(msg.contains("not-a-url"), "Expected URL in: {msg}");
    }

    #[test]
    fn test_invalid_delay_range_display() {
        let error = FetchError::invalid_delay_range(5.0, 2.0);
        let msg = error.to_string();
        assert!(msg.contains('5'), "Expected min bound in: {msg}");
        assert!(msg.contains('2'), "Expected max bound in: {msg}");
    }
}
