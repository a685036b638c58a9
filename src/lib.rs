//! Fetcher Core Library
//!
//! This library provides a sequential scraping client for sites that sit
//! behind basic bot-detection: GET/POST requests and file downloads issued
//! through a browser-profiled HTTP client, paced by a randomized
//! inter-request delay, with GET responses cached on disk under a TTL.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`cache`] - On-disk GET response cache with expiry-on-read
//! - [`fetch`] - Request orchestration: client, rate limiter, operations
//!
//! # Example
//!
//! ```no_run
//! use fetcher_core::Fetcher;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = Fetcher::new()?;
//! let body = fetcher.get("https://example.com/listing").await?;
//! println!("{} bytes", body.len());
//! # Ok(())
//! # }
//! ```

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod fetch;

// Re-export commonly used types
pub use cache::ResponseCache;
pub use fetch::{
    BrowserClient, BrowserProfile, FetchError, Fetcher, FetcherConfig, GetOptions, PostBody,
    RateLimiter,
};
