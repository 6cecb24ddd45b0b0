//! Retry strategies for transient failures.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::FetchError;

/// How the delay grows between retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Same delay every time.
    Fixed,
    /// Delay grows by a constant step per retry.
    Linear(Duration),
    /// Delay doubles per retry.
    Exponential,
}

/// Strategy for retrying failed operations.
#[derive(Debug, Clone)]
pub struct RetryStrategy {
    /// Maximum number of attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Growth of the delay.
    pub backoff: Backoff,
    /// Maximum delay between retries.
    pub max_delay: Duration,
}

impl RetryStrategy {
    /// Creates a retry strategy with exponential backoff from one second.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::from_secs(1),
            backoff: Backoff::Exponential,
            max_delay: Duration::from_secs(60),
        }
    }

    /// Disables retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            backoff: Backoff::Fixed,
            max_delay: Duration::ZERO,
        }
    }

    /// Sets the base delay.
    #[must_use]
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Sets the backoff kind.
    #[must_use]
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Sets the delay cap.
    #[must_use]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Calculates the delay before retry number `attempt` (1-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let n = attempt.saturating_sub(1);
        let delay = match self.backoff {
            Backoff::Fixed => self.base_delay,
            Backoff::Linear(step) => self.base_delay + step * n,
            Backoff::Exponential => self.base_delay.saturating_mul(2u32.saturating_pow(n)),
        };
        delay.min(self.max_delay)
    }

    /// Determines if a transport error should be retried.
    pub fn should_retry(&self, error: &reqwest::Error) -> bool {
        error.is_connect() || error.is_timeout()
    }
}

impl Default for RetryStrategy {
    fn default() -> Self {
        Self::new(3)
    }
}

/// Runs `op` until it succeeds, the error is not retryable, or attempts run
/// out.
///
/// A `Retry-After` hint on a rate-limit error overrides the computed delay.
pub async fn retry_async<T, F, Fut, P>(
    strategy: &RetryStrategy,
    label: &str,
    mut op: F,
    should_retry: P,
) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
    P: Fn(&FetchError) -> bool,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < strategy.max_attempts && should_retry(&e) => {
                let delay = e
                    .retry_after_secs()
                    .map_or_else(|| strategy.delay_for_attempt(attempt), Duration::from_secs);
                warn!(
                    operation = %label,
                    attempt,
                    delay = ?delay,
                    error = %e,
                    "Retrying after transient failure"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_exponential_backoff() {
        let strategy = RetryStrategy::default();

        assert_eq!(strategy.delay_for_attempt(1), Duration::from_secs(1));
        assert_eq!(strategy.delay_for_attempt(2), Duration::from_secs(2));
        assert_eq!(strategy.delay_for_attempt(3), Duration::from_secs(4));
        assert_eq!(strategy.delay_for_attempt(4), Duration::from_secs(8));
    }

    #[test]
    fn test_max_delay_cap() {
        let strategy = RetryStrategy::new(10).with_base_delay(Duration::from_secs(10));

        assert_eq!(strategy.delay_for_attempt(5), Duration::from_secs(60));
    }

    #[test]
    fn test_linear_backoff() {
        let strategy = RetryStrategy::new(4)
            .with_base_delay(Duration::from_secs(60))
            .with_backoff(Backoff::Linear(Duration::from_secs(5)))
            .with_max_delay(Duration::from_secs(600));

        assert_eq!(strategy.delay_for_attempt(1), Duration::from_secs(60));
        assert_eq!(strategy.delay_for_attempt(2), Duration::from_secs(65));
        assert_eq!(strategy.delay_for_attempt(4), Duration::from_secs(75));
    }

    #[tokio::test]
    async fn test_retry_async_recovers() {
        let calls = AtomicU32::new(0);
        let strategy = RetryStrategy::new(3).with_base_delay(Duration::from_millis(1));

        let result = retry_async(
            &strategy,
            "flaky",
            || async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(FetchError::Timeout(1))
                } else {
                    Ok("done")
                }
            },
            FetchError::is_transient,
        )
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_async_stops_on_permanent_error() {
        let calls = AtomicU32::new(0);
        let strategy = RetryStrategy::new(5).with_base_delay(Duration::from_millis(1));

        let result: Result<(), _> = retry_async(
            &strategy,
            "auth",
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(FetchError::AuthenticationFailed("nope".into()))
            },
            FetchError::is_transient,
        )
        .await;

        assert!(matches!(result, Err(FetchError::AuthenticationFailed(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
