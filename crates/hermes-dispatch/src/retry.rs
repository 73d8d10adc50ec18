//! Bounded retry with exponential backoff.

use std::future::Future;
use std::time::Duration;

use hermes_config::RetryConfig;
use tracing::debug;

use crate::error::LogError;

/// How many times, and how patiently, a publish is retried.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use hermes_dispatch::RetryPolicy;
///
/// let policy = RetryPolicy::default();
/// assert_eq!(policy.backoff(1), Duration::from_millis(50));
/// assert_eq!(policy.backoff(2), Duration::from_millis(100));
/// assert_eq!(policy.backoff(10), Duration::from_secs(2));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Attempts including the first one. Never zero.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_backoff: Duration,
    /// Upper bound of any single delay.
    pub max_backoff: Duration,
    /// Growth factor between consecutive delays.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            max_backoff: Duration::from_millis(config.max_backoff_ms),
            multiplier: config.multiplier,
        }
    }
}

/// The operation failed on its last allowed attempt.
#[derive(Debug)]
pub struct RetryExhausted {
    /// Attempts made, including the first.
    pub attempts: u32,
    /// Error of the last attempt.
    pub last_error: LogError,
}

impl RetryPolicy {
    /// A policy that tries exactly once.
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (1-based).
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn backoff(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry.saturating_sub(1)).unwrap_or(i32::MAX);
        let nanos = self.initial_backoff.as_nanos() as f64 * self.multiplier.powi(exponent);
        let cap = self.max_backoff.as_nanos() as f64;
        Duration::from_nanos(nanos.min(cap).max(0.0).round() as u64)
    }

    /// Runs `operation` until it succeeds, fails with a non-retryable error,
    /// or runs out of attempts.
    ///
    /// `operation` receives the 1-based attempt number.
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<(T, u32), RetryExhausted>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, LogError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match operation(attempt).await {
                Ok(value) => return Ok((value, attempt)),
                Err(err) if err.should_retry() && attempt < max_attempts => {
                    let delay = self.backoff(attempt);
                    debug!(attempt, ?delay, error = %err, "retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(last_error) => {
                    return Err(RetryExhausted {
                        attempts: attempt,
                        last_error,
                    })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn fast(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(4),
            multiplier: 2.0,
        }
    }

    #[test]
    fn test_backoff_growth_and_cap() {
        let policy = fast(5);
        assert_eq!(policy.backoff(1), Duration::from_millis(1));
        assert_eq!(policy.backoff(2), Duration::from_millis(2));
        assert_eq!(policy.backoff(3), Duration::from_millis(4));
        assert_eq!(policy.backoff(4), Duration::from_millis(4));
    }

    #[test]
    fn test_from_config_never_zero_attempts() {
        let config = RetryConfig {
            max_attempts: 0,
            ..RetryConfig::default()
        };
        assert_eq!(RetryPolicy::from(&config).max_attempts, 1);
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let calls = &AtomicU32::new(0);
        let result = fast(3)
            .run(move |_| async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(LogError::unavailable("down"))
                } else {
                    Ok("committed")
                }
            })
            .await
            .unwrap();

        assert_eq!(result, ("committed", 3));
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let exhausted = fast(3)
            .run(|_| async { Err::<(), _>(LogError::unavailable("down")) })
            .await
            .unwrap_err();
        assert_eq!(exhausted.attempts, 3);
    }

    #[tokio::test]
    async fn test_rejection_is_not_retried() {
        let exhausted = fast(5)
            .run(|_| async { Err::<(), _>(LogError::rejected("too large")) })
            .await
            .unwrap_err();
        assert_eq!(exhausted.attempts, 1);
        assert!(matches!(exhausted.last_error, LogError::Rejected(_)));
    }
}
