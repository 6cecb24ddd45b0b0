//! Facebook report source.

use std::time::Duration;

use adconnect_core::{AccountId, ConnectionInfo, DateRange, Platform, ReportFrame, SubAccount, Value};
use adconnect_fetch::{FetchError, PollPolicy, ReportSource, poll_until_ready};
use async_trait::async_trait;
use tracing::{debug, info, instrument};

use super::api::{GraphClient, JobStatus};
use super::descriptor::DEFAULT_FIELDS;

/// Fields the account-level insights edge rejects.
const EXCLUDED_FIELDS: &[&str] = &["total_postbacks"];

/// Insights jobs are checked every 2 seconds, 300 times.
fn default_poll_policy() -> PollPolicy {
    PollPolicy::fixed(Duration::from_secs(2), 300)
}

/// Graph ids of ad accounts carry an `act_` prefix.
fn account_node(account: &AccountId) -> String {
    let id = account.as_str();
    if id.starts_with("act_") {
        id.to_string()
    } else {
        format!("act_{id}")
    }
}

/// Graph returns most numbers as strings.
fn insight_value(value: &serde_json::Value) -> Value {
    match value {
        serde_json::Value::String(s) => Value::parse(s),
        other => Value::from_json(other),
    }
}

/// Daily account-level insights for each ad account.
#[derive(Debug, Clone)]
pub struct FacebookSource {
    api: GraphClient,
    poll: PollPolicy,
}

impl FacebookSource {
    /// Creates a source over a Graph client.
    pub fn new(api: GraphClient) -> Self {
        Self {
            api,
            poll: default_poll_policy(),
        }
    }

    /// Overrides the job poll budget.
    #[must_use]
    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    async fn check_job(&self, report_run_id: &str) -> Result<JobStatus, FetchError> {
        let status = self.api.job_status(report_run_id).await?;
        if status.is_failed() {
            return Err(FetchError::ReportFailed(format!(
                "insights job {report_run_id}: {}",
                status.async_status
            )));
        }
        debug!(
            report_run_id,
            status = %status.async_status,
            percent = status.async_percent_completion.unwrap_or(0),
            "Insights job status"
        );
        Ok(status)
    }
}

#[async_trait]
impl ReportSource for FacebookSource {
    fn platform(&self) -> Platform {
        Platform::Facebook
    }

    fn default_dimensions(&self) -> Vec<String> {
        DEFAULT_FIELDS.iter().map(ToString::to_string).collect()
    }

    async fn list_sub_accounts(&self) -> Result<Vec<SubAccount>, FetchError> {
        let accounts = self.api.ad_accounts().await?;
        Ok(accounts
            .into_iter()
            .map(|a| {
                let account = SubAccount::new(a.id, a.name);
                match a.currency {
                    Some(currency) => account.with_currency(currency),
                    None => account,
                }
            })
            .collect())
    }

    async fn describe_connection(&self) -> Result<ConnectionInfo, FetchError> {
        let me = self.api.me().await?;
        let accounts = self.api.ad_accounts().await?;
        let login = me.email.or(me.name).unwrap_or_else(|| me.id.clone());
        Ok(ConnectionInfo::new(Platform::Facebook, login)
            .with_login_account_id(me.id)
            .with_sub_accounts(accounts.len()))
    }

    #[instrument(skip(self, dimensions), fields(account = %account, range = %range))]
    async fn fetch_report(
        &self,
        account: &AccountId,
        range: &DateRange,
        dimensions: &[String],
    ) -> Result<ReportFrame, FetchError> {
        let fields: Vec<String> = if dimensions.is_empty() {
            self.default_dimensions()
        } else {
            dimensions
                .iter()
                .filter(|f| !EXCLUDED_FIELDS.contains(&f.as_str()))
                .cloned()
                .collect()
        };

        let node = account_node(account);
        let run_id = self.api.create_insights_job(&node, range, &fields).await?;
        let run_id = run_id.as_str();
        poll_until_ready(
            &self.poll,
            &format!("insights job {run_id}"),
            move || self.check_job(run_id),
            JobStatus::is_complete,
        )
        .await?;

        let rows = self.api.job_insights(run_id).await?;
        let mut frame = ReportFrame::for_account(account.clone());
        for row in &rows {
            frame.push_row(row.iter().map(|(k, v)| (k, insight_value(v))));
        }

        info!(rows = frame.len(), "Fetched Facebook insights");
        Ok(frame)
    }
}

// ============================================================================
// Tests
// ============================================================================
