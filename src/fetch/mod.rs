//! Rate-limited request orchestration for challenge-protected sites.
//!
//! This module provides the pieces behind [`Fetcher`]:
//!
//! - A browser-profiled HTTP client with a session cookie jar and
//!   challenge-page classification
//! - A randomized inter-request delay shared across all verbs
//! - GET/POST operations returning body text, plus streaming downloads
//! - A typed error taxonomy that contains every failure at the operation
//!   boundary
//!
//! # Example
//!
//! ```no_run
//! use fetcher_core::fetch::Fetcher;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = Fetcher::new()?;
//!
//! // Cached within the TTL window: a repeat GET makes no network call.
//! let first = fetcher.get("https://example.com/listing").await?;
//! let second = fetcher.get("https://example.com/listing").await?;
//! assert_eq!(first, second);
//! # Ok(())
//! # }
//! ```

mod client;
mod constants;
mod error;
mod orchestrator;
mod rate_limiter;

pub use client::{BrowserClient, BrowserProfile, PostBody, is_challenge_body, is_challenge_headers};
pub use constants::{DEFAULT_CACHE_DIR, DEFAULT_CACHE_MAX_AGE, DEFAULT_DELAY_RANGE};
pub use error::FetchError;
pub use orchestrator::{Fetcher, FetcherConfig, GetOptions};
pub use rate_limiter::RateLimiter;
