//! Twitter Ads API client.

use adconnect_fetch::{FetchError, HttpClient};
use chrono::NaiveDate;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use super::oauth::OAuth1Credentials;

// ============================================================================
// Constants
// ============================================================================

/// Ads API base URL, including the API version.
pub const ADS_API_BASE: &str = "https://ads-api.twitter.com/12";

/// Standard API base URL, used for the authenticated user.
pub const USER_API_BASE: &str = "https://api.twitter.com/1.1";

/// Page size for cursor-paged entity lists.
const PAGE_SIZE: &str = "1000";

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
    #[serde(default)]
    next_cursor: Option<String>,
}

/// An ads account.
#[derive(Debug, Clone, Deserialize)]
pub struct AdsAccount {
    /// Account id.
    pub id: String,
    /// Account name.
    #[serde(default)]
    pub name: String,
}

/// A campaign of an ads account.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Campaign {
    /// Campaign id.
    pub id: String,
    /// Campaign name.
    #[serde(default)]
    pub name: String,
    /// `ACTIVE`, `PAUSED`, ...
    #[serde(default)]
    pub entity_status: Option<String>,
    /// Flight start.
    #[serde(default)]
    pub start_time: Option<String>,
    /// Flight end.
    #[serde(default)]
    pub end_time: Option<String>,
    /// Daily budget in micros of the account currency.
    #[serde(default)]
    pub daily_budget_amount_local_micro: Option<i64>,
    /// Total budget in micros of the account currency.
    #[serde(default)]
    pub total_budget_amount_local_micro: Option<i64>,
    /// Account currency.
    #[serde(default)]
    pub currency: Option<String>,
}

/// A line item (ad group); carries the campaign objective.
#[derive(Debug, Clone, Deserialize)]
pub struct LineItem {
    /// Parent campaign.
    pub campaign_id: String,
    /// Objective such as `WEBSITE_CLICKS`.
    #[serde(default)]
    pub objective: Option<String>,
    /// `ACTIVE`, `PAUSED`, ...
    #[serde(default)]
    pub entity_status: Option<String>,
}

/// Stats of one entity.
#[derive(Debug, Clone, Deserialize)]
pub struct StatsEntry {
    /// Entity (campaign) id.
    pub id: String,
    /// Per-segment metrics; the first entry is the unsegmented one.
    #[serde(default)]
    pub id_data: Vec<StatsData>,
}

/// Metrics of one segment. Each metric is an array per granularity bucket,
/// or null when there was no activity.
#[derive(Debug, Clone, Deserialize)]
pub struct StatsData {
    /// Metric name to bucket values.
    #[serde(default)]
    pub metrics: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct User {
    id_str: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    screen_name: Option<String>,
}

/// The authenticated user.
#[derive(Debug, Clone)]
pub struct TwitterUser {
    /// User id.
    pub id: String,
    /// Display name or handle.
    pub name: String,
}

// ============================================================================
// Client
// ============================================================================

/// OAuth 1.0a signed client for the Ads API.
#[derive(Debug, Clone)]
pub struct TwitterClient {
    http: HttpClient,
    credentials: OAuth1Credentials,
    ads_base: String,
    user_base: String,
}

impl TwitterClient {
    /// Creates a client.
    pub fn new(http: HttpClient, credentials: OAuth1Credentials) -> Self {
        Self {
            http,
            credentials,
            ads_base: ADS_API_BASE.to_string(),
            user_base: USER_API_BASE.to_string(),
        }
    }

    /// Overrides both API bases.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base = base_url.into().trim_end_matches('/').to_string();
        self.ads_base.clone_from(&base);
        self.user_base = base;
        self
    }

    /// Signed GET returning JSON.
    async fn get<T: DeserializeOwned>(&self, base: &str, path: &str, query: &[(&str, &str)]) -> Result<T, FetchError> {
        let endpoint = format!("{base}/{}", path.trim_start_matches('/'));
        let url = Url::parse_with_params(&endpoint, query)
            .map_err(|e| FetchError::Config(format!("invalid Twitter URL {endpoint}: {e}")))?;

        let signed: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        let header = self
            .credentials
            .authorization_header("GET", &endpoint, &signed);

        self.http
            .json(self.http.get(url.as_str()).header(AUTHORIZATION, header))
            .await
    }

    /// Reads every page of a cursor-paged list.
    async fn paged<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<Vec<T>, FetchError> {
        let mut items = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut params = query.to_vec();
            params.push(("count", PAGE_SIZE));
            if let Some(c) = cursor.as_deref() {
                params.push(("cursor", c));
            }
            let page: Envelope<Vec<T>> = self.get(&self.ads_base, path, &params).await?;
            items.extend(page.data);

            match page.next_cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => break,
            }
        }

        Ok(items)
    }

    /// Ads accounts the user can access.
    pub async fn accounts(&self) -> Result<Vec<AdsAccount>, FetchError> {
        self.paged("accounts", &[]).await
    }

    /// One ads account.
    pub async fn account(&self, account_id: &str) -> Result<AdsAccount, FetchError> {
        let envelope: Envelope<AdsAccount> = self
            .get(&self.ads_base, &format!("accounts/{account_id}"), &[])
            .await?;
        Ok(envelope.data)
    }

    /// Campaigns of an account.
    pub async fn campaigns(&self, account_id: &str) -> Result<Vec<Campaign>, FetchError> {
        self.paged(&format!("accounts/{account_id}/campaigns"), &[])
            .await
    }

    /// Line items of the given campaigns.
    pub async fn line_items(&self, account_id: &str, campaign_ids: &[String]) -> Result<Vec<LineItem>, FetchError> {
        let ids = campaign_ids.join(",");
        self.paged(
            &format!("accounts/{account_id}/line_items"),
            &[("campaign_ids", ids.as_str())],
        )
        .await
    }

    /// Daily campaign stats for one day.
    #[instrument(skip(self, campaign_ids, metric_groups), fields(campaigns = campaign_ids.len()))]
    pub async fn campaign_stats(
        &self,
        account_id: &str,
        campaign_ids: &[String],
        day: NaiveDate,
        metric_groups: &[String],
    ) -> Result<Vec<StatsEntry>, FetchError> {
        let ids = campaign_ids.join(",");
        let groups = metric_groups.join(",");
        let start = format!("{day}T00:00:00Z");
        let end = format!("{}T00:00:00Z", day.succ_opt().unwrap_or(day));
        debug!(%day, "Requesting campaign stats");

        let envelope: Envelope<Vec<StatsEntry>> = self
            .get(
                &self.ads_base,
                &format!("stats/accounts/{account_id}"),
                &[
                    ("entity", "CAMPAIGN"),
                    ("entity_ids", ids.as_str()),
                    ("start_time", start.as_str()),
                    ("end_time", end.as_str()),
                    ("granularity", "DAY"),
                    ("placement", "ALL_ON_TWITTER"),
                    ("metric_groups", groups.as_str()),
                ],
            )
            .await?;
        Ok(envelope.data)
    }

    /// The user the access token belongs to.
    pub async fn verify_credentials(&self) -> Result<TwitterUser, FetchError> {
        let user: User = self
            .get(&self.user_base, "account/verify_credentials.json", &[])
            .await?;
        Ok(TwitterUser {
            id: user.id_str,
            name: user.screen_name.unwrap_or(user.name),
        })
    }
}
