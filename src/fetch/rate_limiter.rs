//! Randomized inter-request pacing.
//!
//! This module provides the [`RateLimiter`] struct which enforces a randomly
//! sampled delay between consecutive requests, so outbound traffic does not
//! hit a site at machine-regular intervals.
//!
//! # Overview
//!
//! The limiter tracks a single last-request instant shared by every verb
//! (GET, POST, download). Before each network call it samples a delay
//! uniformly from the configured `[min, max]` range and sleeps for whatever
//! part of that delay has not already elapsed. The first request proceeds
//! immediately.
//!
//! # Example
//!
//! ```
//! use fetcher_core::fetch::RateLimiter;
//!
//! # async fn example() -> Result<(), fetcher_core::FetchError> {
//! let limiter = RateLimiter::from_range_secs(2.0, 5.0)?;
//!
//! // First request proceeds immediately
//! limiter.acquire().await;
//!
//! // Second request waits for a freshly sampled delay
//! limiter.acquire().await;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use rand::Rng;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, instrument};

use super::error::FetchError;

/// Enforces a randomly sampled minimum delay between consecutive requests.
///
/// Interior state lives behind a `tokio::sync::Mutex` so pacing composes
/// with `&self` async operations; the last-request instant only moves
/// forward.
#[derive(Debug)]
pub struct RateLimiter {
    /// Lower bound of the sampled delay.
    min_delay: Duration,

    /// Upper bound of the sampled delay.
    max_delay: Duration,

    /// Instant of the most recent request, any verb.
    /// `None` until the first request, which proceeds without delay.
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Creates a limiter from a `[min, max]` delay range in seconds.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidDelayRange`] unless both bounds are
    /// finite, non-negative, and `min <= max`.
    #[instrument]
    pub fn from_range_secs(min: f64, max: f64) -> Result<Self, FetchError> {
        if !min.is_finite() || !max.is_finite() || min < 0.0 || max < min {
            return Err(FetchError::invalid_delay_range(min, max));
        }

        debug!("creating rate limiter");
        Ok(Self {
            min_delay: Duration::from_secs_f64(min),
            max_delay: Duration::from_secs_f64(max),
            last_request: Mutex::new(None),
        })
    }

    /// Returns the lower bound of the delay range.
    #[must_use]
    pub fn min_delay(&self) -> Duration {
        self.min_delay
    }

    /// Returns the upper bound of the delay range.
    #[must_use]
    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Waits until the sampled delay since the previous request has passed.
    ///
    /// Samples a fresh delay uniformly from the configured range, sleeps for
    /// the unelapsed remainder, then records the current instant as the new
    /// last-request time. The first call returns immediately.
    #[instrument(skip(self))]
    pub async fn acquire(&self) {
        let delay = self.sample_delay();

        let mut last_request_guard = self.last_request.lock().await;

        if let Some(last_request) = *last_request_guard {
            let elapsed = last_request.elapsed();

            if elapsed < delay {
                let wait = delay.saturating_sub(elapsed);
                debug!(
                    delay_ms = delay.as_millis(),
                    wait_ms = wait.as_millis(),
                    "applying inter-request delay"
                );
                tokio::time::sleep(wait).await;
            }
        } else {
            debug!("first request - no delay");
        }

        // Update last request time after any delay
        *last_request_guard = Some(Instant::now());
    }

    /// Samples a delay uniformly from `[min, max]`.
    fn sample_delay(&self) -> Duration {
        if self.min_delay == self.max_delay {
            return self.min_delay;
        }
        let secs = rand::thread_rng()
            .gen_range(self.min_delay.as_secs_f64()..=self.max_delay.as_secs_f64());
        Duration::from_secs_f64(secs)
    }
}
