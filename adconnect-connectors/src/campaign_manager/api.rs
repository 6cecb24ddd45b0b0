//! DFA Reporting v4 client.

use adconnect_core::DateRange;
use adconnect_fetch::FetchError;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, instrument};

use crate::google::GoogleClient;

/// DFA Reporting API base URL.
pub const DFA_API_BASE: &str = "https://dfareporting.googleapis.com/dfareporting/v4";

#[derive(Debug, Deserialize)]
struct ProfileList {
    #[serde(default)]
    items: Vec<UserProfile>,
}

/// A Campaign Manager user profile.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Profile id.
    pub profile_id: String,
    /// Login of the profile.
    #[serde(default)]
    pub user_name: String,
    /// Network the profile belongs to.
    #[serde(default)]
    pub account_name: String,
}

/// A file produced by a report run.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportFile {
    /// File id.
    pub id: String,
    /// `PROCESSING`, `REPORT_AVAILABLE`, `FAILED`, or `CANCELLED`.
    #[serde(default)]
    pub status: String,
}

impl ReportFile {
    /// Whether the file can be downloaded.
    pub fn is_available(&self) -> bool {
        self.status == "REPORT_AVAILABLE"
    }

    /// Whether the run ended without a file.
    pub fn is_failed(&self) -> bool {
        matches!(self.status.as_str(), "FAILED" | "CANCELLED")
    }
}

/// Client for user profiles, reports, and report files.
#[derive(Debug, Clone)]
pub struct DfaReportingClient {
    google: GoogleClient,
    base_url: String,
}

impl DfaReportingClient {
    /// Creates a client.
    pub fn new(google: GoogleClient) -> Self {
        Self {
            google,
            base_url: DFA_API_BASE.to_string(),
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

    fn report_url(&self, profile_id: &str, report_id: &str) -> String {
        format!("{}/userprofiles/{profile_id}/reports/{report_id}", self.base_url)
    }

    /// Profiles of the authenticated user.
    pub async fn user_profiles(&self) -> Result<Vec<UserProfile>, FetchError> {
        let list: ProfileList = self
            .google
            .get_json(&format!("{}/userprofiles", self.base_url))
            .await?;
        Ok(list.items)
    }

    /// Moves a saved report to the given dates.
    #[instrument(skip(self), fields(range = %range))]
    pub async fn set_date_range(&self, profile_id: &str, report_id: &str, range: &DateRange) -> Result<(), FetchError> {
        let body = json!({
            "criteria": {
                "dateRange": {
                    "startDate": range.start().to_string(),
                    "endDate": range.end().to_string(),
                }
            }
        });
        let builder = self
            .google
            .http()
            .patch(&self.report_url(profile_id, report_id))
            .json(&body);
        let _: serde_json::Value = self.google.json(builder).await?;
        debug!("Updated report date range");
        Ok(())
    }

    /// Starts a report run.
    pub async fn run(&self, profile_id: &str, report_id: &str) -> Result<ReportFile, FetchError> {
        self.google
            .post_json(&format!("{}/run", self.report_url(profile_id, report_id)), &json!({}))
            .await
    }

    /// Current state of a report file.
    pub async fn file(&self, profile_id: &str, report_id: &str, file_id: &str) -> Result<ReportFile, FetchError> {
        self.google
            .get_json(&format!("{}/files/{file_id}", self.report_url(profile_id, report_id)))
            .await
    }

    /// Downloads the contents of a report file.
    pub async fn download(&self, profile_id: &str, report_id: &str, file_id: &str) -> Result<String, FetchError> {
        self.google
            .get_text(&format!(
                "{}/files/{file_id}?alt=media",
                self.report_url(profile_id, report_id)
            ))
            .await
    }
}
