//! Bounded retry with exponential backoff

use super::IllustrationError;
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// How many times to try and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            multiplier: 2,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-based): base, base*m, base*m^2, ...
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = self.multiplier.saturating_pow(retry.saturating_sub(1));
        self.base_delay.saturating_mul(factor)
    }
}

/// Why the helper gave up
#[derive(Debug, Error, PartialEq)]
pub enum RetryError {
    #[error("terminal failure: {0}")]
    Terminal(IllustrationError),
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        last: IllustrationError,
    },
}

/// Source of delays; swapped out in tests to observe the schedule
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Run `op` until it succeeds, fails terminally, or the policy runs out
pub async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
    mut op: F,
) -> Result<T, RetryError>
where
    F: FnMut(u32) -> Fut + Send,
    Fut: Future<Output = Result<T, IllustrationError>> + Send,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if !e.kind.is_retryable() => return Err(RetryError::Terminal(e)),
            Err(e) if attempt >= max_attempts => {
                return Err(RetryError::Exhausted {
                    attempts: attempt,
                    last: e,
                })
            }
            Err(e) => {
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    attempt,
                    max_attempts,
                    delay_ms = %delay.as_millis(),
                    error = %e,
                    "Retryable illustration failure, backing off"
                );
                sleeper.sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
