//! Aggregation properties over a deterministic mock source.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use adconnect_core::{
    AccountId, ConnectionInfo, DateRange, Platform, ReportFrame, SubAccount, Value,
};
use adconnect_fetch::{
    ACCOUNT_COLUMN, FailurePolicy, FetchError, PollPolicy, ReportAggregator, ReportSource,
    poll_until_ready,
};
use async_trait::async_trait;
use chrono::Datelike;

// ============================================================================
// Mock Source
// ============================================================================

/// One row per account and day, with metric values derived from the date.
#[derive(Default)]
struct DailySource {
    empty: HashSet<String>,
    stuck: HashSet<String>,
    calls: AtomicUsize,
}

impl DailySource {
    fn with_empty(mut self, account: &str) -> Self {
        self.empty.insert(account.to_string());
        self
    }

    fn with_stuck(mut self, account: &str) -> Self {
        self.stuck.insert(account.to_string());
        self
    }
}

fn metric(day: chrono::NaiveDate, dimension: &str, account: &AccountId) -> Value {
    let seed = i64::from(day.ordinal()) * (dimension.len() as i64) + account.as_str().len() as i64;
    Value::Int(seed % 97)
}

#[async_trait]
impl ReportSource for DailySource {
    fn platform(&self) -> Platform {
        Platform::Facebook
    }

    async fn list_sub_accounts(&self) -> Result<Vec<SubAccount>, FetchError> {
        Ok(vec![
            SubAccount::new("act_1", "First"),
            SubAccount::new("act_2", "Second"),
        ])
    }

    async fn describe_connection(&self) -> Result<ConnectionInfo, FetchError> {
        Ok(ConnectionInfo::new(Platform::Facebook, "tester").with_sub_accounts(2))
    }

    async fn fetch_report(
        &self,
        account: &AccountId,
        range: &DateRange,
        dimensions: &[String],
    ) -> Result<ReportFrame, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.stuck.contains(account.as_str()) {
            // The job never leaves the running state.
            poll_until_ready(
                &PollPolicy::fixed(Duration::from_millis(1), 3),
                "insights job",
                || async { Ok::<_, FetchError>("Job Running") },
                |status| *status == "Job Completed",
            )
            .await?;
        }

        let mut frame = ReportFrame::for_account(account.clone());
        if self.empty.contains(account.as_str()) {
            return Ok(frame);
        }

        for day in range.days() {
            let mut cells = vec![("Date Start".to_string(), Value::from(day.to_string()))];
            for dimension in dimensions {
                cells.push((
                    format!("Total {dimension}"),
                    metric(day, dimension, account),
                ));
            }
            frame.push_row(cells);
        }
        Ok(frame)
    }
}

fn dims() -> Vec<String> {
    vec!["clicks".to_string(), "conversions".to_string()]
}

fn range(start: &str, end: &str) -> DateRange {
    DateRange::parse(start, end).unwrap()
}

// ============================================================================
// Properties
// ============================================================================

#[tokio::test]
async fn split_ranges_concatenate_to_whole_range() {
    let source = DailySource::default();
    let accounts = vec![AccountId::new("act_1")];
    let aggregator = ReportAggregator::new();

    let first = aggregator
        .run(&source, &accounts, &range("2022-01-01", "2022-06-01"), &dims())
        .await
        .unwrap();
    let second = aggregator
        .run(&source, &accounts, &range("2022-06-02", "2022-11-14"), &dims())
        .await
        .unwrap();
    let whole = aggregator
        .run(&source, &accounts, &range("2022-01-01", "2022-11-14"), &dims())
        .await
        .unwrap();

    let mut joined = ReportFrame::concat([first.frame, second.frame]);
    let mut whole = whole.frame;
    joined.sort_by_columns(&[ACCOUNT_COLUMN, "date_start"]);
    whole.sort_by_columns(&[ACCOUNT_COLUMN, "date_start"]);

    assert_eq!(whole.len(), 318);
    assert_eq!(joined, whole);
}

#[tokio::test]
async fn empty_accounts_do_not_change_the_result() {
    let source = DailySource::default().with_empty("act_empty");
    let window = range("2022-03-01", "2022-03-31");
    let aggregator = ReportAggregator::new();

    let with_empty = aggregator
        .run(
            &source,
            &[
                AccountId::new("act_1"),
                AccountId::new("act_empty"),
                AccountId::new("act_2"),
            ],
            &window,
            &dims(),
        )
        .await
        .unwrap();
    let without = aggregator
        .run(
            &source,
            &[AccountId::new("act_1"), AccountId::new("act_2")],
            &window,
            &dims(),
        )
        .await
        .unwrap();

    assert_eq!(with_empty.frame, without.frame);
    assert!(with_empty.is_complete());
}

#[tokio::test]
async fn columns_are_lowercase_without_spaces() {
    let source = DailySource::default();
    let outcome = ReportAggregator::new()
        .run(
            &source,
            &[AccountId::new("act_1"), AccountId::new("act_2")],
            &range("2022-01-01", "2022-01-07"),
            &dims(),
        )
        .await
        .unwrap();

    assert_eq!(
        outcome.frame.columns(),
        &["date_start", "total_clicks", "total_conversions", "account_id"]
    );
    for column in outcome.frame.columns() {
        assert_eq!(*column, column.to_lowercase());
        assert!(!column.contains(' '));
    }
}

#[tokio::test]
async fn poll_timeout_is_isolated_to_its_account() {
    let source = DailySource::default().with_stuck("act_stuck");
    let window = range("2022-01-01", "2022-01-10");
    let aggregator = ReportAggregator::new();

    let outcome = aggregator
        .run(
            &source,
            &[AccountId::new("act_1"), AccountId::new("act_stuck")],
            &window,
            &dims(),
        )
        .await
        .unwrap();
    let healthy = aggregator
        .run(&source, &[AccountId::new("act_1")], &window, &dims())
        .await
        .unwrap();

    assert_eq!(outcome.frame, healthy.frame);
    assert_eq!(outcome.failed_accounts(), vec![&AccountId::new("act_stuck")]);
    assert!(outcome.errors()[0].contains("not ready after 3 polls"));
}

#[tokio::test]
async fn poll_timeout_aborts_under_fail_fast() {
    let source = DailySource::default().with_stuck("act_stuck");
    let result = ReportAggregator::new()
        .with_policy(FailurePolicy::FailFast)
        .run(
            &source,
            &[AccountId::new("act_1"), AccountId::new("act_stuck")],
            &range("2022-01-01", "2022-01-10"),
            &dims(),
        )
        .await;

    assert!(matches!(
        result,
        Err(FetchError::PollTimeout { attempts: 3, .. })
    ));
}

#[tokio::test]
async fn run_all_uses_listed_sub_accounts() {
    let source = Arc::new(DailySource::default());
    let outcome = ReportAggregator::new()
        .with_max_concurrency(1)
        .run_all(source.as_ref(), &range("2022-02-01", "2022-02-02"), &dims())
        .await
        .unwrap();

    assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    assert_eq!(outcome.frame.len(), 4);
    let accounts: Vec<_> = outcome
        .frame
        .column_values(ACCOUNT_COLUMN)
        .map(ToString::to_string)
        .collect();
    assert_eq!(accounts, vec!["act_1", "act_1", "act_2", "act_2"]);
}
