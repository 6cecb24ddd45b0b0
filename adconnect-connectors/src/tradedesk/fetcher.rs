//! Trade Desk report source.

use adconnect_core::{AccountId, ConnectionInfo, DateRange, Platform, ReportFrame, SubAccount};
use adconnect_fetch::{FetchError, ReportSource};
use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use super::api::{ReportExecution, TradeDeskClient};
use super::config::DEFAULT_PAGE_SIZE;

/// Downloads completed schedule executions per partner.
#[derive(Debug)]
pub struct TradeDeskSource {
    client: TradeDeskClient,
    partner_ids: Vec<String>,
    report_schedule: Option<String>,
    page_size: u32,
}

impl TradeDeskSource {
    /// Creates a source for the given partners.
    pub fn new(client: TradeDeskClient, partner_ids: Vec<String>) -> Self {
        Self {
            client,
            partner_ids,
            report_schedule: None,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Only downloads executions of this schedule.
    #[must_use]
    pub fn with_report_schedule(mut self, name: Option<String>) -> Self {
        self.report_schedule = name.filter(|n| !n.is_empty());
        self
    }

    /// Sets the execution page size.
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    fn wanted(&self, execution: &ReportExecution) -> bool {
        self.report_schedule
            .as_deref()
            .is_none_or(|name| execution.report_schedule_name == name)
    }
}

#[async_trait]
impl ReportSource for TradeDeskSource {
    fn platform(&self) -> Platform {
        Platform::TradeDesk
    }

    async fn list_sub_accounts(&self) -> Result<Vec<SubAccount>, FetchError> {
        Ok(self
            .partner_ids
            .iter()
            .map(|id| SubAccount::new(id.as_str(), ""))
            .collect())
    }

    async fn describe_connection(&self) -> Result<ConnectionInfo, FetchError> {
        self.client.token().await?;
        Ok(ConnectionInfo::new(Platform::TradeDesk, self.client.username())
            .with_sub_accounts(self.partner_ids.len()))
    }

    #[instrument(skip(self, _dimensions), fields(partner = %account, range = %range))]
    async fn fetch_report(
        &self,
        account: &AccountId,
        range: &DateRange,
        _dimensions: &[String],
    ) -> Result<ReportFrame, FetchError> {
        let executions = self
            .client
            .completed_executions(account.as_str(), range, self.page_size)
            .await?;

        let mut frames = Vec::new();
        for execution in executions.iter().filter(|e| self.wanted(e)) {
            let Some(url) = execution.download_url() else {
                warn!(schedule = %execution.report_schedule_name, "Execution has no download URL");
                continue;
            };
            debug!(schedule = %execution.report_schedule_name, "Downloading report");
            let body = self.client.download(url).await?;
            frames.push(ReportFrame::from_csv_str(&body)?);
        }

        let frame = ReportFrame::concat(frames).tagged(account.clone());
        info!(reports = executions.len(), rows = frame.len(), "Fetched Trade Desk reports");
        Ok(frame)
    }
}

// ============================================================================
// Tests
// ============================================================================
