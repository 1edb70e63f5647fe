//! Bounded retry with exponential backoff.
//!
//! [`RetryExecutor`] runs a fallible async operation up to
//! `max_attempts` times. After the `k`-th failure it waits
//! `min(max_delay, base_delay * multiplier^(k-1))` before the next attempt.
//! Each attempt can additionally be bounded by a per-attempt timeout; an
//! attempt that times out counts as a failure.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Parameters for one kind of retried operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Zero behaves like one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
    pub attempt_timeout: Option<Duration>,
}

impl RetryPolicy {
    /// Policy used for score fetches: 3 attempts, 1s doubling up to 5s,
    /// each attempt bounded to 5s.
    pub fn fetch_default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            multiplier: 2.0,
            max_delay: Duration::from_millis(5000),
            attempt_timeout: Some(Duration::from_secs(5)),
        }
    }

    /// Policy used for publishing: 3 attempts, 2s doubling up to 10s,
    /// each attempt waiting at most 10s for the broker acknowledgement.
    pub fn publish_default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(2000),
            multiplier: 2.0,
            max_delay: Duration::from_millis(10_000),
            attempt_timeout: Some(Duration::from_secs(10)),
        }
    }

    /// Backoff to wait after the `attempt`-th failure (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let millis = self.base_delay.as_millis() as f64 * self.multiplier.powi(exponent);
        let capped = millis.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// Why a single attempt failed.
#[derive(Debug, Error)]
pub enum AttemptError<E> {
    #[error("{0}")]
    Failed(E),

    #[error("attempt timed out after {0:?}")]
    TimedOut(Duration),
}

/// Returned once every attempt has failed.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    #[error("gave up after {attempts} attempts: {last_error}")]
    Exhausted {
        attempts: u32,
        last_error: AttemptError<E>,
    },
}

/// Runs operations under a [`RetryPolicy`].
///
/// `operation` is only a label for logs (e.g. `"fetch"` or `"publish"`).
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    operation: &'static str,
    policy: RetryPolicy,
}

impl RetryExecutor {
    pub fn new(operation: &'static str, policy: RetryPolicy) -> Self {
        Self { operation, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `op` until it succeeds or the attempts are used up.
    pub async fn run<F, Fut, T, E>(&self, mut op: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let max_attempts = self.policy.attempts();
        let mut attempt = 1;

        loop {
            let result = match self.policy.attempt_timeout {
                Some(limit) => match tokio::time::timeout(limit, op()).await {
                    Ok(result) => result.map_err(AttemptError::Failed),
                    Err(_) => Err(AttemptError::TimedOut(limit)),
                },
                None => op().await.map_err(AttemptError::Failed),
            };

            let error = match result {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(operation = self.operation, attempt, "Succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(error) => error,
            };

            if attempt >= max_attempts {
                return Err(RetryError::Exhausted {
                    attempts: attempt,
                    last_error: error,
                });
            }

            let delay = self.policy.delay_after(attempt);
            warn!(
                operation = self.operation,
                attempt,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Attempt failed, retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
