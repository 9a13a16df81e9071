//! Retry with exponential backoff
//!
//! Every API call goes through [`with_backoff`]. The caller supplies the
//! predicate deciding which errors are worth another attempt.

use crate::config::RetryConfig;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Attempt budget and base delay of a retried operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts including the first one
    pub max_attempts: u32,

    /// Delay after the first failure; doubled after each further failure
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.base_delay_ms),
        )
    }

    /// Delay slept after failed attempt number `attempt` (zero-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt.min(16)))
    }
}

/// Runs `op` until it succeeds, fails with a non-retryable error, or the
/// attempt budget is spent
///
/// The last error is returned unchanged, so callers can still tell the
/// failure kinds apart.
pub async fn with_backoff<T, E, F, Fut, P>(policy: &RetryPolicy, is_retryable: P, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: Display,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                attempt += 1;
                if !is_retryable(&e) || attempt >= policy.max_attempts {
                    return Err(e);
                }

                let delay = policy.delay_for(attempt - 1);
                tracing::warn!(
                    "Attempt {}/{} failed, retrying in {:?}: {}",
                    attempt,
                    policy.max_attempts,
                    delay,
                    e
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
