//! DV360 report source.

use std::time::Duration;

use adconnect_core::{AccountId, ConnectionInfo, DateRange, Platform, ReportFrame, SubAccount};
use adconnect_fetch::{FetchError, PollPolicy, ReportSource, poll_until_ready};
use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use super::api::{BidManagerClient, QuerySpec, Report};
use super::config::DEFAULT_REPORT_WINDOW_HOURS;
use super::descriptor::{ALL_ADVERTISERS, DEFAULT_METRICS};
use super::parser::parse_report;

/// Reports are checked from every 5s up to every minute, for at most five
/// hours.
fn default_poll_policy() -> PollPolicy {
    PollPolicy::exponential(
        Duration::from_secs(5),
        Duration::from_secs(60),
        Duration::from_secs(18_000),
    )
}

/// One-time Bid Manager queries per advertiser.
#[derive(Debug, Clone)]
pub struct Dv360Source {
    client: BidManagerClient,
    advertiser_ids: Vec<String>,
    frequency: String,
    group_bys: Vec<String>,
    report_window: chrono::Duration,
    poll: PollPolicy,
}

impl Dv360Source {
    /// Creates a source for the given advertisers (empty for all).
    pub fn new(client: BidManagerClient, advertiser_ids: Vec<String>) -> Self {
        Self {
            client,
            advertiser_ids,
            frequency: "ONE_TIME".to_string(),
            group_bys: Vec::new(),
            report_window: chrono::Duration::hours(i64::from(DEFAULT_REPORT_WINDOW_HOURS)),
            poll: default_poll_policy(),
        }
    }

    /// Sets the schedule frequency of created queries.
    #[must_use]
    pub fn with_frequency(mut self, frequency: impl Into<String>) -> Self {
        self.frequency = frequency.into();
        self
    }

    /// Adds group-bys after date and advertiser.
    #[must_use]
    pub fn with_group_bys(mut self, group_bys: Vec<String>) -> Self {
        self.group_bys = group_bys;
        self
    }

    /// Sets the age after which a report is considered stale.
    #[must_use]
    pub fn with_report_window_hours(mut self, hours: u32) -> Self {
        self.report_window = chrono::Duration::hours(i64::from(hours));
        self
    }

    /// Replaces the report poll policy.
    #[must_use]
    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    /// Creates a query without running it and returns its id.
    pub async fn create_query(
        &self,
        range: &DateRange,
        advertiser: Option<&str>,
        metrics: &[String],
    ) -> Result<String, FetchError> {
        let metrics = if metrics.is_empty() {
            self.default_dimensions()
        } else {
            metrics.to_vec()
        };
        self.client
            .create_query(&QuerySpec {
                range,
                advertiser,
                metrics: &metrics,
                group_bys: &self.group_bys,
                frequency: &self.frequency,
            })
            .await
    }

    /// Downloads the newest finished report of an existing query.
    #[instrument(skip(self))]
    pub async fn latest_report(&self, query_id: &str) -> Result<ReportFrame, FetchError> {
        let report = self
            .client
            .reports(query_id)
            .await?
            .into_iter()
            .filter(Report::is_done)
            .max_by_key(|r| r.metadata.status.finish_time)
            .ok_or_else(|| FetchError::ReportFailed(format!("query {query_id} has no finished report")))?;
        self.download(&report).await
    }

    async fn check_report(&self, query_id: &str, report_id: &str) -> Result<Report, FetchError> {
        let report = self.client.report(query_id, report_id).await?;
        if report.is_failed() {
            return Err(FetchError::ReportFailed(format!(
                "DV360 report {query_id}/{report_id} failed"
            )));
        }
        debug!(query_id, report_id, state = %report.metadata.status.state, "Report status");
        Ok(report)
    }

    fn warn_if_stale(&self, report: &Report) {
        let Some(finished) = report.metadata.status.finish_time else {
            return;
        };
        if finished < Utc::now() - self.report_window {
            warn!(
                query_id = %report.key.query_id,
                report_id = %report.key.report_id,
                finished = %finished,
                window_hours = self.report_window.num_hours(),
                "Report is older than the report window"
            );
        }
    }

    async fn download(&self, report: &Report) -> Result<ReportFrame, FetchError> {
        self.warn_if_stale(report);
        let url = report
            .metadata
            .google_cloud_storage_path
            .as_deref()
            .ok_or_else(|| {
                FetchError::InvalidResponse(format!(
                    "report {}/{} has no storage path",
                    report.key.query_id, report.key.report_id
                ))
            })?;
        let body = self.client.download(url).await?;
        Ok(parse_report(&body)?)
    }
}

#[async_trait]
impl ReportSource for Dv360Source {
    fn platform(&self) -> Platform {
        Platform::Dv360
    }

    fn default_dimensions(&self) -> Vec<String> {
        DEFAULT_METRICS.iter().map(ToString::to_string).collect()
    }

    async fn list_sub_accounts(&self) -> Result<Vec<SubAccount>, FetchError> {
        if self.advertiser_ids.is_empty() {
            return Ok(vec![SubAccount::new(ALL_ADVERTISERS, "All advertisers")]);
        }
        Ok(self
            .advertiser_ids
            .iter()
            .map(|id| SubAccount::new(id.as_str(), ""))
            .collect())
    }

    async fn describe_connection(&self) -> Result<ConnectionInfo, FetchError> {
        let user = self.client.google().auth().user_info().await?;
        Ok(ConnectionInfo::new(Platform::Dv360, user.email)
            .with_login_account_id(user.id)
            .with_sub_accounts(self.advertiser_ids.len()))
    }

    #[instrument(skip(self, dimensions), fields(advertiser = %account, range = %range))]
    async fn fetch_report(
        &self,
        account: &AccountId,
        range: &DateRange,
        dimensions: &[String],
    ) -> Result<ReportFrame, FetchError> {
        let advertiser = Some(account.as_str()).filter(|a| *a != ALL_ADVERTISERS);
        let query_id = self.create_query(range, advertiser, dimensions).await?;

        let run = self.client.run_query(&query_id).await?;
        let report_id = run.key.report_id.as_str();
        let query = query_id.as_str();
        let report = poll_until_ready(
            &self.poll,
            &format!("DV360 report {query_id}/{report_id}"),
            move || self.check_report(query, report_id),
            Report::is_done,
        )
        .await?;

        let frame = self.download(&report).await?.tagged(account.clone());
        info!(query_id = %query_id, rows = frame.len(), "Fetched DV360 report");
        Ok(frame)
    }
}

// ============================================================================
// Tests
// ============================================================================
