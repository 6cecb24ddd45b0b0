//! Analytics Reporting and Management API client.

use adconnect_core::DateRange;
use adconnect_fetch::FetchError;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::google::GoogleClient;

/// Reporting API v4 base URL.
pub const REPORTING_API_BASE: &str = "https://analyticsreporting.googleapis.com/v4";

/// Management API v3 base URL.
pub const MANAGEMENT_API_BASE: &str = "https://www.googleapis.com/analytics/v3/management";

/// Rows per report page.
const PAGE_SIZE: u32 = 10_000;

// ============================================================================
// Request Types
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchGetRequest<'a> {
    report_requests: [ReportRequest<'a>; 1],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReportRequest<'a> {
    view_id: &'a str,
    date_ranges: [GaDateRange; 1],
    metrics: Vec<Metric<'a>>,
    dimensions: Vec<Dimension<'a>>,
    page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    page_token: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GaDateRange {
    start_date: String,
    end_date: String,
}

#[derive(Serialize)]
struct Metric<'a> {
    expression: &'a str,
}

#[derive(Serialize)]
struct Dimension<'a> {
    name: &'a str,
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct BatchGetResponse {
    #[serde(default)]
    reports: Vec<Report>,
}

/// One report of a `batchGet` response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Dimension and metric names.
    #[serde(default)]
    pub column_header: ColumnHeader,
    /// Rows of this page.
    #[serde(default)]
    pub data: ReportData,
    /// Token of the next page, if any.
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Column names of a report.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnHeader {
    /// Dimension names such as `ga:date`.
    #[serde(default)]
    pub dimensions: Vec<String>,
    /// Metric names.
    #[serde(default)]
    pub metric_header: MetricHeader,
}

/// Metric names of a report.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricHeader {
    /// One entry per metric.
    #[serde(default)]
    pub metric_header_entries: Vec<MetricHeaderEntry>,
}

/// A metric column.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricHeaderEntry {
    /// Metric name such as `ga:users`.
    pub name: String,
}

/// Report rows.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportData {
    /// Absent when the view had no traffic.
    #[serde(default)]
    pub rows: Vec<ReportRow>,
}

/// One row: dimension values, then one value list per date range.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportRow {
    /// Dimension values.
    #[serde(default)]
    pub dimensions: Vec<String>,
    /// Metric values per date range.
    #[serde(default)]
    pub metrics: Vec<DateRangeValues>,
}

/// Metric values for one date range.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DateRangeValues {
    /// Values in metric header order.
    #[serde(default)]
    pub values: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ProfileList {
    #[serde(default)]
    items: Vec<View>,
}

/// A reporting view (profile).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct View {
    /// View id.
    pub id: String,
    /// View name.
    #[serde(default)]
    pub name: String,
    /// Currency of the view.
    #[serde(default)]
    pub currency: Option<String>,
    /// Owning property, e.g. `UA-1234-1`.
    #[serde(default)]
    pub web_property_id: Option<String>,
}

// ============================================================================
// Client
// ============================================================================

/// Client for the Reporting and Management APIs.
#[derive(Debug, Clone)]
pub struct AnalyticsClient {
    google: GoogleClient,
    reporting_base: String,
    management_base: String,
}

impl AnalyticsClient {
    /// Creates a client.
    pub fn new(google: GoogleClient) -> Self {
        Self {
            google,
            reporting_base: REPORTING_API_BASE.to_string(),
            management_base: MANAGEMENT_API_BASE.to_string(),
        }
    }

    /// Overrides both API bases.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base = base_url.into().trim_end_matches('/').to_string();
        self.management_base = format!("{base}/management");
        self.reporting_base = base;
        self
    }

    /// The Google client, for userinfo.
    pub fn google(&self) -> &GoogleClient {
        &self.google
    }

    /// Every view the user can read.
    pub async fn views(&self) -> Result<Vec<View>, FetchError> {
        let url = format!(
            "{}/accounts/~all/webproperties/~all/profiles?max-results=1000",
            self.management_base
        );
        let list: ProfileList = self.google.get_json(&url).await?;
        Ok(list.items)
    }

    /// All pages of a report for one view.
    #[instrument(skip(self, metrics, dimensions), fields(range = %range))]
    pub async fn report(
        &self,
        view_id: &str,
        range: &DateRange,
        metrics: &[String],
        dimensions: &[&str],
    ) -> Result<Vec<Report>, FetchError> {
        let url = format!("{}/reports:batchGet", self.reporting_base);
        let mut pages = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let request = BatchGetRequest {
                report_requests: [ReportRequest {
                    view_id,
                    date_ranges: [GaDateRange {
                        start_date: range.start().to_string(),
                        end_date: range.end().to_string(),
                    }],
                    metrics: metrics.iter().map(|m| Metric { expression: m }).collect(),
                    dimensions: dimensions.iter().map(|d| Dimension { name: d }).collect(),
                    page_size: PAGE_SIZE,
                    page_token: token.as_deref(),
                }],
            };
            let response: BatchGetResponse = self.google.post_json(&url, &request).await?;
            let Some(report) = response.reports.into_iter().next() else {
                return Err(FetchError::InvalidResponse("batchGet returned no report".into()));
            };
            token = report.next_page_token.clone().filter(|t| !t.is_empty());
            debug!(rows = report.data.rows.len(), more = token.is_some(), "Report page");
            pages.push(report);

            if token.is_none() {
                break;
            }
        }

        Ok(pages)
    }
}
