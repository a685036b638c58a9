//! Constants for the fetch module (timeouts, pacing, cache defaults).

use std::time::Duration;

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes for large files).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Default inter-request delay range in seconds.
pub const DEFAULT_DELAY_RANGE: (f64, f64) = (2.0, 5.0);

/// Default maximum age before a cached GET response is ignored.
pub const DEFAULT_CACHE_MAX_AGE: Duration = Duration::from_secs(3600);

/// Default on-disk cache directory, relative to the working directory.
pub const DEFAULT_CACHE_DIR: &str = "cache";
