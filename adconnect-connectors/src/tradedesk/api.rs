//! Trade Desk API client.

use adconnect_core::DateRange;
use adconnect_fetch::{FetchError, HttpClient};
use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument};

use super::error::TradeDeskError;

// ============================================================================
// Constants
// ============================================================================

/// TTD API base URL.
pub const TTD_API_BASE: &str = "https://api.thetradedesk.com/v3";

/// Token lifetime requested at login.
const TOKEN_EXPIRATION_MINUTES: u32 = 1440;

/// Header carrying the session token.
const AUTH_HEADER: &str = "TTD-Auth";

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct LoginRequest<'a> {
    login: &'a str,
    password: &'a str,
    token_expiration_in_minutes: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct LoginResponse {
    token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct SortField {
    field_id: &'static str,
    ascending: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ExecutionQuery<'a> {
    partner_ids: [&'a str; 1],
    sort_fields: [SortField; 1],
    report_execution_states: [&'static str; 1],
    execution_spans_start_date: String,
    execution_spans_end_date: String,
    page_start_index: u32,
    page_size: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ExecutionPage {
    #[serde(default)]
    result: Vec<ReportExecution>,
    #[serde(default)]
    total_filtered_count: Option<u32>,
}

/// A completed run of a report schedule.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReportExecution {
    /// Execution id.
    #[serde(default)]
    pub report_execution_id: Option<i64>,
    /// Name of the schedule that produced it.
    #[serde(default)]
    pub report_schedule_name: String,
    /// Where the output was delivered.
    #[serde(default)]
    pub report_deliveries: Vec<ReportDelivery>,
}

impl ReportExecution {
    /// Download URL of the first delivery.
    pub fn download_url(&self) -> Option<&str> {
        self.report_deliveries
            .first()
            .and_then(|d| d.download_url.as_deref())
    }
}

/// One delivery of a report execution.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReportDelivery {
    /// Signed download URL.
    #[serde(rename = "DownloadURL", default)]
    pub download_url: Option<String>,
    /// Delivery path, ending in the file name.
    #[serde(default)]
    pub delivered_path: Option<String>,
}

// ============================================================================
// Client
// ============================================================================

/// TTD client that logs in lazily, once.
#[derive(Debug)]
pub struct TradeDeskClient {
    http: HttpClient,
    base_url: String,
    username: String,
    password: String,
    token: OnceCell<String>,
}

impl TradeDeskClient {
    /// Creates a client for a login.
    pub fn new(http: HttpClient, username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            http,
            base_url: TTD_API_BASE.to_string(),
            username: username.into(),
            password: password.into(),
            token: OnceCell::new(),
        }
    }

    /// Overrides the API base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// The login name.
    pub fn username(&self) -> &str {
        &self.username
    }

    #[instrument(skip(self), fields(user = %self.username))]
    async fn login(&self) -> Result<String, FetchError> {
        let request = LoginRequest {
            login: &self.username,
            password: &self.password,
            token_expiration_in_minutes: TOKEN_EXPIRATION_MINUTES,
        };
        let response: LoginResponse = self
            .http
            .post_json(&format!("{}/authentication", self.base_url), &request)
            .await
            .map_err(|e| match TradeDeskError::map(e) {
                FetchError::Api { body, .. } => FetchError::AuthenticationFailed(body),
                other => other,
            })?;
        info!("Logged in to The Trade Desk");
        Ok(response.token)
    }

    /// Session token, logging in on first use.
    pub async fn token(&self) -> Result<&str, FetchError> {
        self.token
            .get_or_try_init(|| self.login())
            .await
            .map(String::as_str)
    }

    async fn authorized(&self, builder: RequestBuilder) -> Result<RequestBuilder, FetchError> {
        Ok(builder.header(AUTH_HEADER, self.token().await?))
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, FetchError> {
        let builder = self.authorized(builder).await?;
        self.http.json(builder).await.map_err(TradeDeskError::map)
    }

    /// Completed executions for a partner whose span overlaps the range.
    #[instrument(skip(self), fields(range = %range))]
    pub async fn completed_executions(
        &self,
        partner_id: &str,
        range: &DateRange,
        page_size: u32,
    ) -> Result<Vec<ReportExecution>, FetchError> {
        let url = format!("{}/myreports/reportexecution/query/partners", self.base_url);
        let page_size = page_size.max(1);
        let mut executions = Vec::new();

        loop {
            let query = ExecutionQuery {
                partner_ids: [partner_id],
                sort_fields: [SortField {
                    field_id: "Timezone",
                    ascending: true,
                }],
                report_execution_states: ["Complete"],
                execution_spans_start_date: range.start().to_string(),
                execution_spans_end_date: range.end().to_string(),
                page_start_index: u32::try_from(executions.len()).unwrap_or(u32::MAX),
                page_size,
            };
            let mut page: ExecutionPage = self.send(self.http.post(&url).json(&query)).await?;
            let received = page.result.len();
            executions.append(&mut page.result);

            let total = page.total_filtered_count.map_or(0, |t| t as usize);
            debug!(received, total, "Report execution page");
            if received == 0 || executions.len() >= total {
                break;
            }
        }

        Ok(executions)
    }

    /// Downloads a report delivery.
    pub async fn download(&self, url: &str) -> Result<String, FetchError> {
        let builder = self.authorized(self.http.get(url)).await?;
        self.http.text(builder).await.map_err(TradeDeskError::map)
    }
}
