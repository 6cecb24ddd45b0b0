//! LinkedIn v2 REST client.

use adconnect_core::DateRange;
use adconnect_fetch::{FetchError, HttpClient};
use chrono::Datelike;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

// ============================================================================
// Constants
// ============================================================================

/// LinkedIn v2 API base URL.
pub const LINKEDIN_API_BASE: &str = "https://api.linkedin.com/v2";

const ACCOUNT_URN: &str = "urn:li:sponsoredAccount:";
const CAMPAIGN_URN: &str = "urn:li:sponsoredCampaign:";

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct Elements<T> {
    #[serde(default = "Vec::new")]
    elements: Vec<T>,
}

/// A sponsored ad account.
#[derive(Debug, Clone, Deserialize)]
pub struct AdAccount {
    /// Account id.
    pub id: i64,
    /// Account name.
    #[serde(default)]
    pub name: String,
    /// ISO currency code.
    #[serde(default)]
    pub currency: Option<String>,
}

/// An amount of money as LinkedIn encodes it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Money {
    /// Decimal amount as a string.
    pub amount: String,
    /// ISO currency code.
    #[serde(default)]
    pub currency_code: Option<String>,
}

/// A sponsored campaign.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    /// Campaign id.
    pub id: i64,
    /// Campaign name.
    #[serde(default)]
    pub name: String,
    /// `ACTIVE`, `PAUSED`, `DRAFT`, ...
    #[serde(default)]
    pub status: String,
    /// Objective such as `WEBSITE_VISIT`.
    #[serde(default)]
    pub objective_type: Option<String>,
    /// Daily budget.
    #[serde(default)]
    pub daily_budget: Option<Money>,
    /// Bid per unit.
    #[serde(default)]
    pub unit_cost: Option<Money>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Profile {
    id: String,
    #[serde(default)]
    localized_first_name: String,
    #[serde(default)]
    localized_last_name: String,
}

// ============================================================================
// Client
// ============================================================================

/// Bearer-token client for the LinkedIn Marketing API.
#[derive(Debug, Clone)]
pub struct LinkedInClient {
    http: HttpClient,
    base_url: String,
    access_token: String,
}

impl LinkedInClient {
    /// Creates a client.
    pub fn new(http: HttpClient, access_token: impl Into<String>) -> Self {
        Self {
            http,
            base_url: LINKEDIN_API_BASE.to_string(),
            access_token: access_token.into(),
        }
    }

    /// Overrides the API base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T, FetchError> {
        let builder = self
            .http
            .get(&format!("{}/{path}", self.base_url))
            .bearer_auth(&self.access_token)
            .query(query);
        self.http.json(builder).await
    }

    /// Active business accounts of the member.
    pub async fn ad_accounts(&self) -> Result<Vec<AdAccount>, FetchError> {
        let page: Elements<AdAccount> = self
            .get(
                "adAccountsV2",
                &[
                    ("q", "search".to_string()),
                    ("search.type.values[0]", "BUSINESS".to_string()),
                    ("search.status.values[0]", "ACTIVE".to_string()),
                ],
            )
            .await?;
        Ok(page.elements)
    }

    /// One ad account.
    pub async fn ad_account(&self, account_id: &str) -> Result<AdAccount, FetchError> {
        self.get(&format!("adAccountsV2/{account_id}"), &[]).await
    }

    /// Campaigns of an account, drafts included.
    pub async fn campaigns(&self, account_id: &str) -> Result<Vec<Campaign>, FetchError> {
        let page: Elements<Campaign> = self
            .get(
                "adCampaignsV2",
                &[
                    ("q", "search".to_string()),
                    ("search.account.values[0]", format!("{ACCOUNT_URN}{account_id}")),
                ],
            )
            .await?;
        Ok(page.elements)
    }

    /// Analytics elements of one campaign over the whole range.
    #[instrument(skip(self, fields), fields(range = %range))]
    pub async fn campaign_analytics(
        &self,
        campaign_id: i64,
        range: &DateRange,
        fields: &str,
    ) -> Result<Vec<serde_json::Map<String, serde_json::Value>>, FetchError> {
        let (start, end) = (range.start(), range.end());
        debug!(fields, "Requesting campaign analytics");
        let page: Elements<serde_json::Map<String, serde_json::Value>> = self
            .get(
                "adAnalyticsV2",
                &[
                    ("q", "analytics".to_string()),
                    ("pivot", "CAMPAIGN".to_string()),
                    ("dateRange.start.day", start.day().to_string()),
                    ("dateRange.start.month", start.month().to_string()),
                    ("dateRange.start.year", start.year().to_string()),
                    ("dateRange.end.day", end.day().to_string()),
                    ("dateRange.end.month", end.month().to_string()),
                    ("dateRange.end.year", end.year().to_string()),
                    ("timeGranularity", "ALL".to_string()),
                    ("campaigns[0]", format!("{CAMPAIGN_URN}{campaign_id}")),
                    ("fields", fields.to_string()),
                ],
            )
            .await?;
        Ok(page.elements)
    }

    /// The authenticated member as `(id, full name)`.
    pub async fn me(&self) -> Result<(String, String), FetchError> {
        let profile: Profile = self.get("me", &[]).await?;
        let name = format!("{} {}", profile.localized_first_name, profile.localized_last_name);
        Ok((profile.id, name.trim().to_string()))
    }
}
