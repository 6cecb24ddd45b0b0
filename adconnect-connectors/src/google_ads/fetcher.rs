//! Google Ads report source.

use adconnect_core::{AccountId, ConnectionInfo, DateRange, Platform, ReportFrame, SubAccount};
use adconnect_fetch::{FetchError, ReportSource};
use async_trait::async_trait;
use tracing::{info, instrument};

use super::api::GoogleAdsClient;
use super::descriptor::DEFAULT_FIELDS;
use super::gaql::{build_query, field_value};

/// Daily campaign metrics for every client account of a manager.
#[derive(Debug, Clone)]
pub struct GoogleAdsSource {
    client: GoogleAdsClient,
}

impl GoogleAdsSource {
    /// Creates a source.
    pub fn new(client: GoogleAdsClient) -> Self {
        Self { client }
    }

    async fn roots(&self) -> Result<Vec<String>, FetchError> {
        match self.client.login_customer_id() {
            Some(manager) => Ok(vec![manager.to_string()]),
            None => self.client.accessible_customers().await,
        }
    }
}

#[async_trait]
impl ReportSource for GoogleAdsSource {
    fn platform(&self) -> Platform {
        Platform::GoogleAds
    }

    fn default_dimensions(&self) -> Vec<String> {
        DEFAULT_FIELDS.iter().map(ToString::to_string).collect()
    }

    async fn list_sub_accounts(&self) -> Result<Vec<SubAccount>, FetchError> {
        let roots = self.roots().await?;
        Ok(self
            .client
            .client_accounts(roots)
            .await?
            .into_iter()
            .map(|c| {
                let account = SubAccount::new(c.id, c.descriptive_name);
                match c.currency_code {
                    Some(currency) => account.with_currency(currency),
                    None => account,
                }
            })
            .collect())
    }

    async fn describe_connection(&self) -> Result<ConnectionInfo, FetchError> {
        let user = self.client.google().auth().user_info().await?;
        let accounts = self.list_sub_accounts().await?;
        let mut info = ConnectionInfo::new(Platform::GoogleAds, user.email).with_sub_accounts(accounts.len());
        if let Some(manager) = self.client.login_customer_id() {
            info = info.with_login_account_id(manager);
        }
        Ok(info)
    }

    #[instrument(skip(self, dimensions), fields(customer = %account, range = %range))]
    async fn fetch_report(
        &self,
        account: &AccountId,
        range: &DateRange,
        dimensions: &[String],
    ) -> Result<ReportFrame, FetchError> {
        let fields = if dimensions.is_empty() {
            self.default_dimensions()
        } else {
            dimensions.to_vec()
        };
        let query = build_query(&fields, range);
        let rows = self.client.search_stream(account.as_str(), &query).await?;

        let mut frame = ReportFrame::with_columns(fields.iter().cloned()).tagged(account.clone());
        for row in &rows {
            frame.push_values(fields.iter().map(|f| field_value(row, f)).collect())?;
        }

        info!(rows = frame.len(), "Fetched Google Ads campaign metrics");
        Ok(frame)
    }
}

// ============================================================================
// Tests
// ============================================================================
