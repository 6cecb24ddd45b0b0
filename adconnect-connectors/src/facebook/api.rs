//! Graph API client.

use adconnect_core::DateRange;
use adconnect_fetch::{FetchError, HttpClient};
use reqwest::RequestBuilder;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use super::error::GraphError;

// ============================================================================
// Constants
// ============================================================================

/// Graph API host.
pub const GRAPH_API_BASE: &str = "https://graph.facebook.com";

/// Async job states that end a report run without rows.
const FAILED_STATES: &[&str] = &["Job Failed", "Job Skipped"];

/// Async job state of a finished report run.
const COMPLETED: &str = "Job Completed";

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
    #[serde(default)]
    paging: Option<Paging>,
}

#[derive(Debug, Deserialize)]
struct Paging {
    #[serde(default)]
    next: Option<String>,
}

/// An ad account visible to the token.
#[derive(Debug, Clone, Deserialize)]
pub struct AdAccount {
    /// `act_<id>`.
    pub id: String,
    /// Account name.
    #[serde(default)]
    pub name: String,
    /// ISO currency code.
    #[serde(default)]
    pub currency: Option<String>,
}

/// The token owner.
#[derive(Debug, Clone, Deserialize)]
pub struct Me {
    /// User id.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Email, if the token has the `email` permission.
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReportRun {
    report_run_id: String,
}

/// Status of an async insights job.
#[derive(Debug, Clone, Deserialize)]
pub struct JobStatus {
    /// Report run id.
    #[serde(default)]
    pub id: String,
    /// `Job Not Started`, `Job Running`, `Job Completed`, ...
    pub async_status: String,
    /// Progress percentage.
    #[serde(default)]
    pub async_percent_completion: Option<u32>,
}

impl JobStatus {
    /// Returns true once rows can be read.
    pub fn is_complete(&self) -> bool {
        self.async_status == COMPLETED
    }

    /// Returns true if the job ended without rows.
    pub fn is_failed(&self) -> bool {
        FAILED_STATES.contains(&self.async_status.as_str())
    }
}

// ============================================================================
// Graph Client
// ============================================================================

/// Minimal Graph API client for ad accounts and insights.
#[derive(Debug, Clone)]
pub struct GraphClient {
    http: HttpClient,
    base_url: String,
    api_version: String,
    access_token: String,
}

impl GraphClient {
    /// Creates a client for a token and API version.
    pub fn new(http: HttpClient, access_token: impl Into<String>, api_version: impl Into<String>) -> Self {
        Self {
            http,
            base_url: GRAPH_API_BASE.to_string(),
            api_version: api_version.into(),
            access_token: access_token.into(),
        }
    }

    /// Overrides the Graph host.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.api_version,
            path.trim_start_matches('/')
        )
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, FetchError> {
        self.http.json(builder).await.map_err(GraphError::map)
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.http
            .get(&self.url(path))
            .query(&[("access_token", self.access_token.as_str())])
    }

    /// Reads every page of an edge, following `paging.next`.
    async fn paged<T: DeserializeOwned>(&self, first: RequestBuilder) -> Result<Vec<T>, FetchError> {
        let mut page: Page<T> = self.send(first).await?;
        let mut items = Vec::new();

        loop {
            items.append(&mut page.data);
            let Some(next) = page.paging.and_then(|p| p.next) else {
                break;
            };
            debug!(items = items.len(), "Following Graph paging cursor");
            // Cursor URLs already carry the access token.
            page = self.send(self.http.get(&next)).await?;
        }

        Ok(items)
    }

    /// The token owner.
    pub async fn me(&self) -> Result<Me, FetchError> {
        self.send(self.get("me").query(&[("fields", "id,name,email")]))
            .await
    }

    /// Every ad account the token can read.
    #[instrument(skip(self))]
    pub async fn ad_accounts(&self) -> Result<Vec<AdAccount>, FetchError> {
        self.paged(self.get("me/adaccounts").query(&[("fields", "id,name,currency")]))
            .await
    }

    /// Starts an async insights job with one row per day.
    #[instrument(skip(self, fields), fields(range = %range))]
    pub async fn create_insights_job(
        &self,
        account: &str,
        range: &DateRange,
        fields: &[String],
    ) -> Result<String, FetchError> {
        let time_range = serde_json::json!({
            "since": range.start().to_string(),
            "until": range.end().to_string(),
        })
        .to_string();
        let fields = fields.join(",");

        let form = [
            ("access_token", self.access_token.as_str()),
            ("time_range", time_range.as_str()),
            ("level", "account"),
            ("time_increment", "1"),
            ("fields", fields.as_str()),
        ];
        let run: ReportRun = self
            .send(self.http.post(&self.url(&format!("{account}/insights"))).form(&form))
            .await?;
        debug!(report_run_id = %run.report_run_id, "Insights job created");
        Ok(run.report_run_id)
    }

    /// Current state of an insights job.
    pub async fn job_status(&self, report_run_id: &str) -> Result<JobStatus, FetchError> {
        self.send(
            self.get(report_run_id)
                .query(&[("fields", "id,async_status,async_percent_completion")]),
        )
        .await
    }

    /// Rows of a completed insights job.
    pub async fn job_insights(
        &self,
        report_run_id: &str,
    ) -> Result<Vec<serde_json::Map<String, serde_json::Value>>, FetchError> {
        self.paged(
            self.get(&format!("{report_run_id}/insights"))
                .query(&[("limit", "500")]),
        )
        .await
    }
}
