// @file: market_relay/src/core/retry.rs
// @description: Exponential-backoff retry around upstream calls, triggered only by rate-limit signals.
// @author: LAS.

use crate::core::error::{RelayError, UpstreamError};
use log::warn;
use std::future::Future;
use tokio::time::{sleep, Duration};


#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3, initial_delay: Duration::from_millis(1000) }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self { max_attempts: max_attempts.max(1), initial_delay }
    }

    /// Runs `action` until it succeeds, fails without a rate-limit signal, or attempts run out.
    /// The delay doubles after every rate-limited attempt, no jitter.
    pub async fn execute<T, F, Fut>(&self, mut action: F) -> Result<T, RelayError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, UpstreamError>>,
    {
        let mut delay: Duration = self.initial_delay;

        for attempt in 1..=self.max_attempts {
            match action().await {
                Ok(value) => return Ok(value),
                Err(err) if err.rate_limited => {
                    // No point sleeping once the last attempt is spent.
                    if attempt == self.max_attempts {
                        warn!("Rate limited on final attempt {}/{}: {}", attempt, self.max_attempts, err);
                        break;
                    }
                    warn!(
                        "Rate limited (attempt {}/{}): {}. Retrying in {}ms...",
                        attempt, self.max_attempts, err, delay.as_millis()
                    );
                    sleep(delay).await;
                    delay *= 2;
                }
                Err(err) => return Err(RelayError::UpstreamException(err.message)),
            }
        }

        Err(RelayError::RateLimitExceeded)
    }
}
