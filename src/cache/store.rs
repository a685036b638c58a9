//! Cache storage: entry format, key derivation, read/write.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

/// One cached response, persisted as a JSON object.
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    /// When the entry was written (RFC 3339).
    timestamp: DateTime<Utc>,
    /// The originating request URL.
    url: String,
    /// The raw response body.
    data: String,
}

/// Stores GET response bodies on disk, one file per URL.
///
/// The store holds no in-memory state beyond the directory path; it is
/// cheap to clone and safe to share. A single process writing to the
/// directory is assumed - concurrent writers race last-writer-wins on a
/// given entry file.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    /// Directory where entry files are stored.
    cache_dir: PathBuf,
}

impl ResponseCache {
    /// Creates a cache rooted at the given directory.
    ///
    /// The directory is not created until the first write.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    /// Returns the cache directory.
    #[must_use]
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Returns the entry file path for a URL.
    ///
    /// The name combines the lowercased host (`unknown` when the URL does
    /// not parse) with the SHA-256 of the full URL string, so the same URL
    /// string always maps to the same file.
    #[must_use]
    pub fn entry_path(&self, url: &str) -> PathBuf {
        let host = host_component(url);
        let hash = url_hash(url);
        self.cache_dir.join(format!("{host}_{hash}.json"))
    }

    /// Reads the cached body for a URL if present and younger than `max_age`.
    ///
    /// Returns `None` when no entry exists, the entry has aged past
    /// `max_age` (the file is left in place), or the file cannot be read or
    /// parsed. Failures are logged at debug level and never propagated.
    pub async fn read(&self, url: &str, max_age: Duration) -> Option<String> {
        let path = self.entry_path(url);
        let content = tokio::fs::read_to_string(&path).await.ok()?;

        let entry: CacheEntry = match serde_json::from_str(&content) {
            Ok(entry) => entry,
            Err(error) => {
                debug!(
                    path = %path.display(),
                    error = %error,
                    "unreadable cache entry, treating as miss"
                );
                return None;
            }
        };

        let age = Utc::now().signed_duration_since(entry.timestamp);
        match age.to_std() {
            Ok(age) if age >= max_age => {
                debug!(
                    path = %path.display(),
                    age_secs = age.as_secs(),
                    "cache entry expired"
                );
                None
            }
            // Negative age (future timestamp) reads as fresh.
            _ => Some(entry.data),
        }
    }

    /// Writes a fresh entry for a URL, overwriting any existing one.
    ///
    /// Creates the cache directory if absent.
    ///
    /// # Errors
    ///
    /// Returns the underlying IO error when the directory or file cannot be
    /// written, or the entry cannot be serialized.
    pub async fn write(&self, url: &str, data: &str) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.cache_dir).await?;

        let entry = CacheEntry {
            timestamp: Utc::now(),
            url: url.to_string(),
            data: data.to_string(),
        };
        let json = serde_json::to_string(&entry)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        let path = self.entry_path(url);
        tokio::fs::write(&path, json).await?;
        debug!(path = %path.display(), bytes = data.len(), "cache entry written");
        Ok(())
    }
}

/// Lowercased host of a URL, `unknown` when it cannot be parsed.
fn host_component(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_lowercase))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Hex-encoded SHA-256 of the full URL string.
fn url_hash(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    digest.iter().fold(String::with_capacity(64), |mut out, byte| {
        let _ = write!(out, "{byte:02x}");
        out
    })
}
