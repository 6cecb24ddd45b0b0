//! Bid Manager v2 client.

use adconnect_core::DateRange;
use adconnect_fetch::FetchError;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::google::GoogleClient;

// ============================================================================
// Constants
// ============================================================================

/// Bid Manager API base URL.
pub const DBM_API_BASE: &str = "https://doubleclickbidmanager.googleapis.com/v2";

/// Title given to created queries.
pub const REPORT_TITLE: &str = "DV360 Automation API-generated report";

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Serialize)]
struct ApiDate {
    year: i32,
    month: u32,
    day: u32,
}

impl From<NaiveDate> for ApiDate {
    fn from(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
            day: date.day(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DataRange {
    range: &'static str,
    custom_start_date: ApiDate,
    custom_end_date: ApiDate,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryMetadata<'a> {
    title: &'a str,
    data_range: DataRange,
    format: &'static str,
}

#[derive(Debug, Serialize)]
struct Filter<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    value: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Params<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    group_bys: Vec<String>,
    metrics: &'a [String],
    filters: Vec<Filter<'a>>,
}

#[derive(Debug, Serialize)]
struct Schedule<'a> {
    frequency: &'a str,
}

#[derive(Debug, Serialize)]
struct Query<'a> {
    metadata: QueryMetadata<'a>,
    params: Params<'a>,
    schedule: Schedule<'a>,
}

/// What a created query reports on.
#[derive(Debug, Clone)]
pub struct QuerySpec<'a> {
    /// Inclusive date range.
    pub range: &'a DateRange,
    /// Advertiser filter; `None` reports on every advertiser.
    pub advertiser: Option<&'a str>,
    /// Metrics, e.g. `METRIC_CLICKS`.
    pub metrics: &'a [String],
    /// Group-bys after `FILTER_DATE` and `FILTER_ADVERTISER`.
    pub group_bys: &'a [String],
    /// Schedule frequency.
    pub frequency: &'a str,
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedQuery {
    query_id: String,
}

#[derive(Debug, Deserialize)]
struct ReportList {
    #[serde(default)]
    reports: Vec<Report>,
}

/// A report run of a query.
#[derive(Debug, Clone, Deserialize)]
pub struct Report {
    /// Query and report ids.
    pub key: ReportKey,
    /// Status and output location.
    #[serde(default)]
    pub metadata: ReportMetadata,
}

/// Identifies a report.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportKey {
    /// Parent query.
    pub query_id: String,
    /// Report id.
    pub report_id: String,
}

/// Report metadata.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    /// Processing status.
    #[serde(default)]
    pub status: ReportStatus,
    /// Signed Cloud Storage URL of the output, once done.
    #[serde(default)]
    pub google_cloud_storage_path: Option<String>,
}

/// Processing status of a report.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportStatus {
    /// `QUEUED`, `RUNNING`, `DONE`, or `FAILED`.
    #[serde(default)]
    pub state: String,
    /// When processing finished.
    #[serde(default)]
    pub finish_time: Option<DateTime<Utc>>,
}

impl Report {
    /// Whether the report finished successfully.
    pub fn is_done(&self) -> bool {
        self.metadata.status.state == "DONE"
    }

    /// Whether the report failed.
    pub fn is_failed(&self) -> bool {
        self.metadata.status.state == "FAILED"
    }
}

// ============================================================================
// Client
// ============================================================================

/// Client for the query and report endpoints.
#[derive(Debug, Clone)]
pub struct BidManagerClient {
    google: GoogleClient,
    base_url: String,
}

impl BidManagerClient {
    /// Creates a client.
    pub fn new(google: GoogleClient) -> Self {
        Self {
            google,
            base_url: DBM_API_BASE.to_string(),
        }
    }

    /// Overrides the API base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// The authorized Google client.
    pub fn google(&self) -> &GoogleClient {
        &self.google
    }

    /// Creates a query and returns its id.
    #[instrument(skip(self, spec), fields(range = %spec.range, advertiser = ?spec.advertiser))]
    pub async fn create_query(&self, spec: &QuerySpec<'_>) -> Result<String, FetchError> {
        let mut group_bys = vec!["FILTER_DATE".to_string(), "FILTER_ADVERTISER".to_string()];
        for extra in spec.group_bys {
            if !group_bys.contains(extra) {
                group_bys.push(extra.clone());
            }
        }

        let query = Query {
            metadata: QueryMetadata {
                title: REPORT_TITLE,
                data_range: DataRange {
                    range: "CUSTOM_DATES",
                    custom_start_date: spec.range.start().into(),
                    custom_end_date: spec.range.end().into(),
                },
                format: "CSV",
            },
            params: Params {
                kind: "STANDARD",
                group_bys,
                metrics: spec.metrics,
                filters: spec
                    .advertiser
                    .map(|value| Filter {
                        kind: "FILTER_ADVERTISER",
                        value,
                    })
                    .into_iter()
                    .collect(),
            },
            schedule: Schedule {
                frequency: spec.frequency,
            },
        };

        let created: CreatedQuery = self
            .google
            .post_json(&format!("{}/queries", self.base_url), &query)
            .await?;
        debug!(query_id = %created.query_id, "Created query");
        Ok(created.query_id)
    }

    /// Starts a run of a query.
    pub async fn run_query(&self, query_id: &str) -> Result<Report, FetchError> {
        self.google
            .post_json(
                &format!("{}/queries/{query_id}:run", self.base_url),
                &serde_json::json!({}),
            )
            .await
    }

    /// Current state of a report.
    pub async fn report(&self, query_id: &str, report_id: &str) -> Result<Report, FetchError> {
        self.google
            .get_json(&format!("{}/queries/{query_id}/reports/{report_id}", self.base_url))
            .await
    }

    /// Reports of a query.
    pub async fn reports(&self, query_id: &str) -> Result<Vec<Report>, FetchError> {
        let list: ReportList = self
            .google
            .get_json(&format!("{}/queries/{query_id}/reports", self.base_url))
            .await?;
        Ok(list.reports)
    }

    /// Downloads a report file. Storage paths are signed URLs, so no token
    /// is sent.
    pub async fn download(&self, url: &str) -> Result<String, FetchError> {
        self.google.http().download_text(url).await
    }
}
