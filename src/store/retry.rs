//! Bounded retry with exponential backoff for store connections.
//!
//! Only used while connecting at startup. Inserts are never retried here;
//! callers decide.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

const MAX_DELAY: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, initial_delay: Duration) -> Self {
        Self {
            max_retries,
            initial_delay,
        }
    }

    /// Delay before retry number `attempt` (0-based), doubling and capped
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.initial_delay.saturating_mul(factor).min(MAX_DELAY)
    }

    pub async fn run<F, Fut, T, E>(&self, what: &str, f: F) -> Result<T, E>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let mut attempt = 0;
        loop {
            match f().await {
                Ok(value) => {
                    if attempt > 0 {
                        tracing::info!(what, attempt, "Succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) if attempt < self.max_retries => {
                    let delay = self.delay_for_attempt(attempt);
                    tracing::warn!(what, attempt, delay = ?delay, error = %e, "Failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(what, attempts = attempt + 1, error = %e, "Giving up");
                    return Err(e);
                }
            }
        }
    }
}
