//! Poll-until-ready for remote asynchronous report jobs.
//!
//! Several platforms run reports as background jobs: the client creates the
//! job, then checks its status until it completes. [`poll_until_ready`] is
//! the one loop every connector uses for that, parameterized by a
//! [`PollPolicy`] and a completion predicate.

use std::future::Future;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::FetchError;

/// Interval, attempt budget, and deadline for a poll loop.
#[derive(Debug, Clone)]
pub struct PollPolicy {
    /// Delay after the first unsuccessful check.
    pub interval: Duration,
    /// Cap on the delay when backing off.
    pub max_interval: Duration,
    /// Double the delay after every check.
    pub exponential: bool,
    /// Maximum number of status checks.
    pub max_attempts: u32,
    /// Wall-clock budget for the whole loop.
    pub deadline: Option<Duration>,
}

impl PollPolicy {
    /// Fixed delay between at most `max_attempts` checks.
    pub fn fixed(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_interval: interval,
            exponential: false,
            max_attempts,
            deadline: None,
        }
    }

    /// Exponential backoff from `initial` up to `max_interval`, bounded by a
    /// wall-clock deadline.
    pub fn exponential(initial: Duration, max_interval: Duration, deadline: Duration) -> Self {
        Self {
            interval: initial,
            max_interval,
            exponential: true,
            max_attempts: u32::MAX,
            deadline: Some(deadline),
        }
    }

    /// Sets the attempt budget.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Delay after unsuccessful check number `attempt` (1-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if !self.exponential {
            return self.interval;
        }
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.interval.saturating_mul(factor).min(self.max_interval)
    }
}

/// Checks a remote status until `is_ready` accepts it.
///
/// `check` is called once per attempt. Errors it returns propagate
/// immediately, so a connector that sees a terminal failure state should
/// return [`FetchError::ReportFailed`]. Exhausting the attempts or the
/// deadline yields [`FetchError::PollTimeout`].
pub async fn poll_until_ready<S, F, Fut, P>(
    policy: &PollPolicy,
    label: &str,
    mut check: F,
    is_ready: P,
) -> Result<S, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<S, FetchError>>,
    P: Fn(&S) -> bool,
{
    let started = Instant::now();
    let mut attempt = 0;

    while attempt < policy.max_attempts {
        attempt += 1;
        let status = check().await?;
        if is_ready(&status) {
            debug!(job = %label, attempts = attempt, elapsed = ?started.elapsed(), "Job ready");
            return Ok(status);
        }
        if attempt == policy.max_attempts {
            break;
        }

        let delay = policy.delay_for_attempt(attempt);
        if let Some(deadline) = policy.deadline {
            if started.elapsed() + delay > deadline {
                break;
            }
        }
        debug!(job = %label, attempt, delay = ?delay, "Job not ready, waiting");
        tokio::time::sleep(delay).await;
    }

    warn!(job = %label, attempts = attempt, elapsed = ?started.elapsed(), "Poll budget exhausted");
    Err(FetchError::PollTimeout {
        label: label.to_string(),
        attempts: attempt,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_fixed_delay() {
        let policy = PollPolicy::fixed(Duration::from_secs(2), 300);
        assert_eq!(policy.delay_for_attempt(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for_attempt(50), Duration::from_secs(2));
    }

    #[test]
    fn test_exponential_delay_capped() {
        let policy = PollPolicy::exponential(
            Duration::from_secs(5),
            Duration::from_secs(60),
            Duration::from_secs(18_000),
        );
        assert_eq!(policy.delay_for_attempt(1), Duration::from_secs(5));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_secs(10));
        assert_eq!(policy.delay_for_attempt(4), Duration::from_secs(40));
        assert_eq!(policy.delay_for_attempt(5), Duration::from_secs(60));
        assert_eq!(policy.delay_for_attempt(40), Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_ready_after_some_polls() {
        let calls = AtomicU32::new(0);
        let policy = PollPolicy::fixed(Duration::from_millis(1), 10);

        let status = poll_until_ready(
            &policy,
            "job",
            || async { Ok::<_, FetchError>(calls.fetch_add(1, Ordering::SeqCst) + 1) },
            |n| *n >= 3,
        )
        .await
        .unwrap();

        assert_eq!(status, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_timeout_after_budget() {
        let calls = AtomicU32::new(0);
        let policy = PollPolicy::fixed(Duration::from_millis(1), 4);

        let result = poll_until_ready(
            &policy,
            "never",
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, FetchError>("Job Running")
            },
            |s| *s == "Job Completed",
        )
        .await;

        match result {
            Err(FetchError::PollTimeout { label, attempts }) => {
                assert_eq!(label, "never");
                assert_eq!(attempts, 4);
            }
            other => panic!("expected timeout, got {other:?}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_deadline_stops_early() {
        let calls = AtomicU32::new(0);
        let policy = PollPolicy::exponential(
            Duration::from_millis(50),
            Duration::from_millis(50),
            Duration::from_millis(10),
        );

        let result = poll_until_ready(
            &policy,
            "slow",
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, FetchError>(false)
            },
            |done| *done,
        )
        .await;

        assert!(matches!(result, Err(FetchError::PollTimeout { attempts: 1, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_check_error_propagates() {
        let policy = PollPolicy::fixed(Duration::from_millis(1), 10);
        let result: Result<(), _> = poll_until_ready(
            &policy,
            "failing",
            || async { Err(FetchError::ReportFailed("Job Failed".into())) },
            |_| true,
        )
        .await;
        assert!(matches!(result, Err(FetchError::ReportFailed(_))));
    }
}
