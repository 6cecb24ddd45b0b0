//! Multi-account report aggregation.
//!
//! The aggregator fans one report request out over many accounts,
//! concurrently on the calling task, waits for every fetch to finish, drops
//! empty frames, and concatenates the rest in the order the accounts were
//! given. Column names of the result are normalized.

use std::future::Future;
use std::time::{Duration, Instant};

use adconnect_core::{AccountId, DateRange, ReportFrame, Value};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

use crate::error::FetchError;
use crate::source::ReportSource;

/// Column added to every non-empty account frame that lacks it.
pub const ACCOUNT_COLUMN: &str = "account_id";

// ============================================================================
// Options
// ============================================================================

/// What a per-account failure does to the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Log the error and treat the account as having no data.
    ///
    /// Fatal errors ([`FetchError::is_fatal`]) still abort the batch.
    #[default]
    Isolate,
    /// Abort the batch with the first failure in account order.
    FailFast,
}

/// Aggregation options.
#[derive(Debug, Clone)]
pub struct AggregateOptions {
    /// Per-account failure handling.
    pub policy: FailurePolicy,
    /// Maximum fetches in flight. `None` means all accounts at once.
    pub max_concurrency: Option<usize>,
    /// Add an [`ACCOUNT_COLUMN`] to frames that lack one.
    pub tag_accounts: bool,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            policy: FailurePolicy::Isolate,
            max_concurrency: None,
            tag_accounts: true,
        }
    }
}

// ============================================================================
// Outcomes
// ============================================================================

/// Record of one account's fetch.
#[derive(Debug, Clone)]
pub struct AccountOutcome {
    /// The account.
    pub account: AccountId,
    /// Rows contributed to the aggregate.
    pub rows: usize,
    /// Error if the fetch failed.
    pub error: Option<String>,
    /// How long the fetch took.
    pub duration: Duration,
}

impl AccountOutcome {
    /// Creates a successful outcome record.
    pub fn success(account: AccountId, rows: usize, duration: Duration) -> Self {
        Self {
            account,
            rows,
            error: None,
            duration,
        }
    }

    /// Creates a failed outcome record.
    pub fn failure(account: AccountId, error: impl Into<String>, duration: Duration) -> Self {
        Self {
            account,
            rows: 0,
            error: Some(error.into()),
            duration,
        }
    }

    /// Returns true if the fetch succeeded (possibly with no rows).
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of an aggregation.
#[derive(Debug)]
pub struct AggregateOutcome {
    /// Concatenated, normalized frame.
    pub frame: ReportFrame,
    /// One record per requested account, in request order.
    pub accounts: Vec<AccountOutcome>,
    /// Total wall time.
    pub duration: Duration,
}

impl AggregateOutcome {
    /// Accounts whose fetch failed and were isolated.
    pub fn failed_accounts(&self) -> Vec<&AccountId> {
        self.accounts
            .iter()
            .filter(|a| !a.is_success())
            .map(|a| &a.account)
            .collect()
    }

    /// All errors that occurred.
    pub fn errors(&self) -> Vec<&str> {
        self.accounts
            .iter()
            .filter_map(|a| a.error.as_deref())
            .collect()
    }

    /// Returns true if every account fetch succeeded.
    pub fn is_complete(&self) -> bool {
        self.accounts.iter().all(AccountOutcome::is_success)
    }
}

// ============================================================================
// Aggregation
// ============================================================================

/// Aggregates per-account reports produced by `fetch`.
///
/// Every account is fetched with the same range and dimensions. The fetches
/// run concurrently and are all awaited; this function does not retry.
/// Empty frames are dropped, the rest concatenated in `accounts` order, and
/// the final column names normalized.
#[instrument(skip_all, fields(accounts = accounts.len(), range = %range))]
pub async fn aggregate_reports<F, Fut>(
    accounts: &[AccountId],
    range: &DateRange,
    dimensions: &[String],
    options: &AggregateOptions,
    fetch: F,
) -> Result<AggregateOutcome, FetchError>
where
    F: Fn(AccountId, DateRange, Vec<String>) -> Fut,
    Fut: Future<Output = Result<ReportFrame, FetchError>>,
{
    let start = Instant::now();
    let limit = options.max_concurrency.unwrap_or(accounts.len()).max(1);

    info!(count = accounts.len(), limit, "Aggregating account reports");

    let results: Vec<(AccountId, Result<ReportFrame, FetchError>, Duration)> =
        stream::iter(accounts.iter().cloned())
            .map(|account| {
                let pending = fetch(account.clone(), *range, dimensions.to_vec());
                async move {
                    let began = Instant::now();
                    let result = pending.await;
                    (account, result, began.elapsed())
                }
            })
            .buffered(limit)
            .collect()
            .await;

    let mut frames = Vec::with_capacity(results.len());
    let mut outcomes = Vec::with_capacity(results.len());

    for (account, result, duration) in results {
        match result {
            Ok(mut frame) => {
                if frame.is_empty() {
                    debug!(account = %account, duration = ?duration, "No data for account");
                    outcomes.push(AccountOutcome::success(account, 0, duration));
                    continue;
                }
                if options.tag_accounts && !frame.has_column(ACCOUNT_COLUMN) {
                    frame.set_constant(ACCOUNT_COLUMN, &Value::from(account.as_str()));
                }
                debug!(account = %account, rows = frame.len(), duration = ?duration, "Account fetched");
                outcomes.push(AccountOutcome::success(account, frame.len(), duration));
                frames.push(frame);
            }
            Err(e) if e.is_fatal() || options.policy == FailurePolicy::FailFast => {
                error!(account = %account, error = %e, "Account fetch failed, aborting batch");
                return Err(e);
            }
            Err(e) => {
                error!(account = %account, error = %e, "Account fetch failed, treating as empty");
                outcomes.push(AccountOutcome::failure(account, e.to_string(), duration));
            }
        }
    }

    let mut frame = ReportFrame::concat(frames);
    frame.normalize_columns();

    let outcome = AggregateOutcome {
        frame,
        accounts: outcomes,
        duration: start.elapsed(),
    };
    info!(
        rows = outcome.frame.len(),
        failed = outcome.failed_accounts().len(),
        duration = ?outcome.duration,
        "Aggregation finished"
    );
    Ok(outcome)
}

/// Runs [`aggregate_reports`] against a [`ReportSource`].
#[derive(Debug, Clone, Default)]
pub struct ReportAggregator {
    options: AggregateOptions,
}

impl ReportAggregator {
    /// Creates an aggregator with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an aggregator with the given options.
    pub fn with_options(options: AggregateOptions) -> Self {
        Self { options }
    }

    /// Sets the failure policy.
    #[must_use]
    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.options.policy = policy;
        self
    }

    /// Limits the number of fetches in flight.
    #[must_use]
    pub fn with_max_concurrency(mut self, limit: usize) -> Self {
        self.options.max_concurrency = Some(limit);
        self
    }

    /// Returns the options.
    pub fn options(&self) -> &AggregateOptions {
        &self.options
    }

    /// Aggregates the given accounts.
    pub async fn run(
        &self,
        source: &dyn ReportSource,
        accounts: &[AccountId],
        range: &DateRange,
        dimensions: &[String],
    ) -> Result<AggregateOutcome, FetchError> {
        aggregate_reports(accounts, range, dimensions, &self.options, |account, range, dims| async move {
            source.fetch_report(&account, &range, &dims).await
        })
        .await
    }

    /// Lists the source's sub-accounts and aggregates all of them.
    pub async fn run_all(
        &self,
        source: &dyn ReportSource,
        range: &DateRange,
        dimensions: &[String],
    ) -> Result<AggregateOutcome, FetchError> {
        let accounts: Vec<AccountId> = source
            .list_sub_accounts()
            .await?
            .into_iter()
            .map(|a| a.id)
            .collect();
        self.run(source, &accounts, range, dimensions).await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::sync::Barrier;

    fn range() -> DateRange {
        DateRange::parse("2022-01-01", "2022-01-02").unwrap()
    }

    fn ids(names: &[&str]) -> Vec<AccountId> {
        names.iter().map(|n| AccountId::new(*n)).collect()
    }

    fn one_row(account: &AccountId) -> ReportFrame {
        let mut frame = ReportFrame::for_account(account.clone());
        frame.push_row([("Campaign Name", Value::from(format!("{account} campaign")))]);
        frame
    }

    #[tokio::test]
    async fn test_concatenates_in_account_order() {
        let accounts = ids(&["b", "a", "c"]);
        let outcome = aggregate_reports(
            &accounts,
            &range(),
            &[],
            &AggregateOptions::default(),
            |account, _, _| async move {
                // Finish in reverse order of the input.
                let delay = match account.as_str() {
                    "b" => 30,
                    "a" => 15,
                    _ => 0,
                };
                tokio::time::sleep(Duration::from_millis(delay)).await;
                Ok(one_row(&account))
            },
        )
        .await
        .unwrap();

        let order: Vec<_> = outcome
            .frame
            .column_values(ACCOUNT_COLUMN)
            .map(ToString::to_string)
            .collect();
        assert_eq!(order, vec!["b", "a", "c"]);
        assert_eq!(outcome.frame.columns(), &["campaign_name", "account_id"]);
        assert!(outcome.is_complete());
    }

    #[tokio::test]
    async fn test_fetches_run_concurrently() {
        let accounts = ids(&["a", "b", "c", "d"]);
        let barrier = Arc::new(Barrier::new(accounts.len()));

        let range = range();
        let options = AggregateOptions::default();
        let run = aggregate_reports(
            &accounts,
            &range,
            &[],
            &options,
            |account, _, _| {
                let barrier = Arc::clone(&barrier);
                async move {
                    // Deadlocks unless every fetch is in flight at once.
                    barrier.wait().await;
                    Ok(one_row(&account))
                }
            },
        );

        let outcome = tokio::time::timeout(Duration::from_secs(5), run)
            .await
            .expect("fetches were not concurrent")
            .unwrap();
        assert_eq!(outcome.frame.len(), 4);
    }

    #[tokio::test]
    async fn test_drops_empty_frames() {
        let accounts = ids(&["a", "empty", "c"]);
        let outcome = aggregate_reports(
            &accounts,
            &range(),
            &[],
            &AggregateOptions::default(),
            |account, _, _| async move {
                if account.as_str() == "empty" {
                    Ok(ReportFrame::with_columns(["Unrelated Column"]))
                } else {
                    Ok(one_row(&account))
                }
            },
        )
        .await
        .unwrap();

        assert_eq!(outcome.frame.len(), 2);
        assert!(!outcome.frame.has_column("unrelated_column"));
        assert_eq!(outcome.accounts[1].rows, 0);
        assert!(outcome.accounts[1].is_success());
    }

    #[tokio::test]
    async fn test_isolates_account_failures() {
        let accounts = ids(&["a", "bad", "c"]);
        let outcome = aggregate_reports(
            &accounts,
            &range(),
            &[],
            &AggregateOptions::default(),
            |account, _, _| async move {
                if account.as_str() == "bad" {
                    Err(FetchError::InvalidResponse("missing data".into()))
                } else {
                    Ok(one_row(&account))
                }
            },
        )
        .await
        .unwrap();

        assert_eq!(outcome.frame.len(), 2);
        assert_eq!(outcome.failed_accounts(), vec![&AccountId::new("bad")]);
        assert_eq!(outcome.errors().len(), 1);
        assert!(!outcome.is_complete());
    }

    #[tokio::test]
    async fn test_fail_fast_propagates() {
        let accounts = ids(&["a", "bad"]);
        let options = AggregateOptions {
            policy: FailurePolicy::FailFast,
            ..AggregateOptions::default()
        };
        let result = aggregate_reports(&accounts, &range(), &[], &options, |account, _, _| async move {
            if account.as_str() == "bad" {
                Err(FetchError::ReportFailed("Job Failed".into()))
            } else {
                Ok(one_row(&account))
            }
        })
        .await;

        assert!(matches!(result, Err(FetchError::ReportFailed(_))));
    }

    #[tokio::test]
    async fn test_auth_failure_is_fatal_even_when_isolating() {
        let accounts = ids(&["a", "b"]);
        let result = aggregate_reports(
            &accounts,
            &range(),
            &[],
            &AggregateOptions::default(),
            |_, _, _| async move { Err(FetchError::AuthenticationFailed("expired".into())) },
        )
        .await;

        assert!(matches!(result, Err(FetchError::AuthenticationFailed(_))));
    }

    #[tokio::test]
    async fn test_keeps_existing_account_column() {
        let accounts = ids(&["a"]);
        let outcome = aggregate_reports(
            &accounts,
            &range(),
            &[],
            &AggregateOptions::default(),
            |_, _, _| async move {
                let mut frame = ReportFrame::new();
                frame.push_row([("account_id", Value::from("123456"))]);
                Ok(frame)
            },
        )
        .await
        .unwrap();

        assert_eq!(outcome.frame.get(0, ACCOUNT_COLUMN), Some(&Value::from("123456")));
    }

    #[tokio::test]
    async fn test_no_accounts() {
        let outcome = aggregate_reports(
            &[],
            &range(),
            &[],
            &AggregateOptions::default(),
            |account, _, _| async move { Ok(one_row(&account)) },
        )
        .await
        .unwrap();

        assert!(outcome.frame.is_empty());
        assert!(outcome.accounts.is_empty());
    }
}
