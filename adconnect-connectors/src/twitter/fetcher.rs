//! Twitter Ads report source.

use adconnect_core::{AccountId, ConnectionInfo, DateRange, Platform, ReportFrame, SubAccount};
use adconnect_fetch::{FetchError, ReportSource};
use async_trait::async_trait;
use tracing::{debug, info, instrument};

use super::api::TwitterClient;
use super::descriptor::DEFAULT_METRIC_GROUPS;
use super::parser::{campaign_index, push_stats_rows};

/// The stats endpoint accepts at most this many entity ids.
const MAX_ENTITY_IDS: usize = 20;

/// Daily campaign stats per ads account.
#[derive(Debug, Clone)]
pub struct TwitterSource {
    client: TwitterClient,
}

impl TwitterSource {
    /// Creates a source over a signed client.
    pub fn new(client: TwitterClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ReportSource for TwitterSource {
    fn platform(&self) -> Platform {
        Platform::Twitter
    }

    fn default_dimensions(&self) -> Vec<String> {
        DEFAULT_METRIC_GROUPS.iter().map(ToString::to_string).collect()
    }

    async fn list_sub_accounts(&self) -> Result<Vec<SubAccount>, FetchError> {
        Ok(self
            .client
            .accounts()
            .await?
            .into_iter()
            .map(|a| SubAccount::new(a.id, a.name))
            .collect())
    }

    async fn describe_connection(&self) -> Result<ConnectionInfo, FetchError> {
        let user = self.client.verify_credentials().await?;
        let accounts = self.client.accounts().await?;
        Ok(ConnectionInfo::new(Platform::Twitter, user.name)
            .with_login_account_id(user.id)
            .with_sub_accounts(accounts.len()))
    }

    #[instrument(skip(self, dimensions), fields(account = %account, range = %range))]
    async fn fetch_report(
        &self,
        account: &AccountId,
        range: &DateRange,
        dimensions: &[String],
    ) -> Result<ReportFrame, FetchError> {
        let account_id = account.as_str();
        let metric_groups = if dimensions.is_empty() {
            self.default_dimensions()
        } else {
            dimensions.to_vec()
        };

        let details = self.client.account(account_id).await?;
        let campaigns = self.client.campaigns(account_id).await?;
        if campaigns.is_empty() {
            debug!("Account has no campaigns");
            return Ok(ReportFrame::for_account(account.clone()));
        }

        let ids: Vec<String> = campaigns.iter().map(|c| c.id.clone()).collect();
        let mut line_items = Vec::new();
        for chunk in ids.chunks(MAX_ENTITY_IDS) {
            line_items.extend(self.client.line_items(account_id, chunk).await?);
        }
        let index = campaign_index(campaigns, &line_items);

        let mut frame = ReportFrame::for_account(account.clone());
        for day in range.days() {
            for chunk in ids.chunks(MAX_ENTITY_IDS) {
                let stats = self
                    .client
                    .campaign_stats(account_id, chunk, day, &metric_groups)
                    .await?;
                push_stats_rows(&mut frame, &index, &stats, day, &details.name);
            }
        }

        info!(campaigns = ids.len(), rows = frame.len(), "Fetched Twitter campaign stats");
        Ok(frame)
    }
}

// ============================================================================
// Tests
// ============================================================================
