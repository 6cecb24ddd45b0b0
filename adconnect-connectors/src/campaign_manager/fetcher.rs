//! Campaign Manager report source.

use std::time::Duration;

use adconnect_core::{AccountId, ConnectionInfo, DateRange, Platform, ReportFrame, SubAccount};
use adconnect_fetch::{FetchError, PollPolicy, ReportSource, poll_until_ready};
use async_trait::async_trait;
use tracing::{debug, info, instrument};

use super::api::{DfaReportingClient, ReportFile};
use super::config::{ReportRef, distinct_profile_ids};
use super::parser::parse_report;

/// Report files are checked every 30 seconds, up to an hour.
fn default_poll_policy() -> PollPolicy {
    PollPolicy::fixed(Duration::from_secs(30), 120)
}

/// Runs the configured saved reports of each user profile.
#[derive(Debug, Clone)]
pub struct CampaignManagerSource {
    client: DfaReportingClient,
    reports: Vec<ReportRef>,
    poll: PollPolicy,
}

impl CampaignManagerSource {
    /// Creates a source for the given reports.
    pub fn new(client: DfaReportingClient, reports: Vec<ReportRef>) -> Self {
        Self {
            client,
            reports,
            poll: default_poll_policy(),
        }
    }

    /// Replaces the file poll policy.
    #[must_use]
    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    async fn check_file(&self, report: &ReportRef, file_id: &str) -> Result<ReportFile, FetchError> {
        let file = self
            .client
            .file(&report.profile_id, &report.report_id, file_id)
            .await?;
        if file.is_failed() {
            return Err(FetchError::ReportFailed(format!(
                "report {report} file {file_id}: {}",
                file.status
            )));
        }
        debug!(report = %report, file_id, status = %file.status, "Report file status");
        Ok(file)
    }

    #[instrument(skip(self), fields(report = %report, range = %range))]
    async fn run_report(&self, report: &ReportRef, range: &DateRange) -> Result<ReportFrame, FetchError> {
        self.client
            .set_date_range(&report.profile_id, &report.report_id, range)
            .await?;
        let file = self.client.run(&report.profile_id, &report.report_id).await?;
        let file_id = file.id.as_str();

        poll_until_ready(
            &self.poll,
            &format!("report {report} file {file_id}"),
            move || self.check_file(report, file_id),
            ReportFile::is_available,
        )
        .await?;

        let body = self
            .client
            .download(&report.profile_id, &report.report_id, file_id)
            .await?;
        Ok(parse_report(&body, &report.report_id)?)
    }
}

#[async_trait]
impl ReportSource for CampaignManagerSource {
    fn platform(&self) -> Platform {
        Platform::CampaignManager
    }

    async fn list_sub_accounts(&self) -> Result<Vec<SubAccount>, FetchError> {
        let profiles = self.client.user_profiles().await?;
        Ok(distinct_profile_ids(&self.reports)
            .into_iter()
            .map(|id| {
                let name = profiles
                    .iter()
                    .find(|p| p.profile_id == id)
                    .map(|p| p.user_name.clone())
                    .unwrap_or_default();
                SubAccount::new(id, name)
            })
            .collect())
    }

    async fn describe_connection(&self) -> Result<ConnectionInfo, FetchError> {
        let user = self.client.google().auth().user_info().await?;
        Ok(ConnectionInfo::new(Platform::CampaignManager, user.email)
            .with_login_account_id(user.id)
            .with_sub_accounts(distinct_profile_ids(&self.reports).len()))
    }

    #[instrument(skip(self, _dimensions), fields(profile = %account, range = %range))]
    async fn fetch_report(
        &self,
        account: &AccountId,
        range: &DateRange,
        _dimensions: &[String],
    ) -> Result<ReportFrame, FetchError> {
        let mut frames = Vec::new();
        for report in self.reports.iter().filter(|r| r.profile_id == account.as_str()) {
            frames.push(self.run_report(report, range).await?);
        }

        let frame = ReportFrame::concat(frames).tagged(account.clone());
        info!(rows = frame.len(), "Fetched Campaign Manager reports");
        Ok(frame)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::google::testing::authorized_client;
    use adconnect_core::Value;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const FILE: &str = "Acme\n\nReport Fields\nDate,Campaign,Clicks\n2022-09-01,Spring,15\nGrand Total:,,15\n";

    async fn source(server: &MockServer, dir: &tempfile::TempDir, reports: Vec<ReportRef>) -> CampaignManagerSource {
        let google = authorized_client(dir.path(), &server.uri()).await;
        CampaignManagerSource::new(DfaReportingClient::new(google).with_base_url(server.uri()), reports)
            .with_poll_policy(PollPolicy::fixed(Duration::from_millis(5), 3))
    }

    async fn mount_run(server: &MockServer, report: &str, file: &str, status: &str) {
        Mock::given(method("PATCH"))
            .and(path(format!("/userprofiles/58/reports/{report}")))
            .and(body_json(json!({"criteria": {"dateRange": {"startDate": "2022-09-01", "endDate": "2022-09-02"}}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": report})))
            .expect(1)
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path(format!("/userprofiles/58/reports/{report}/run")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": file, "status": "PROCESSING"})))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/userprofiles/58/reports/{report}/files/{file}")))
            .and(query_param("alt", "media"))
            .respond_with(ResponseTemplate::new(200).set_body_string(FILE))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/userprofiles/58/reports/{report}/files/{file}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": file, "status": status})))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_runs_each_report_of_profile() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        mount_run(&server, "101", "f1", "REPORT_AVAILABLE").await;
        mount_run(&server, "102", "f2", "REPORT_AVAILABLE").await;

        let reports = vec![
            ReportRef::new("58", "101"),
            ReportRef::new("58", "102"),
            ReportRef::new("77", "900"),
        ];
        let range = DateRange::parse("2022-09-01", "2022-09-02").unwrap();
        let frame = source(&server, &dir, reports)
            .await
            .fetch_report(&AccountId::new("58"), &range, &[])
            .await
            .unwrap();

        assert_eq!(frame.len(), 2);
        assert_eq!(frame.get(0, "report_id"), Some(&Value::Text("101".into())));
        assert_eq!(frame.get(1, "report_id"), Some(&Value::Text("102".into())));
        assert_eq!(frame.account().map(AccountId::as_str), Some("58"));
    }

    #[tokio::test]
    async fn test_cancelled_file() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        mount_run(&server, "101", "f1", "CANCELLED").await;

        let range = DateRange::parse("2022-09-01", "2022-09-02").unwrap();
        let err = source(&server, &dir, vec![ReportRef::new("58", "101")])
            .await
            .fetch_report(&AccountId::new("58"), &range, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::ReportFailed(_)));
    }

    #[tokio::test]
    async fn test_profiles_and_describe() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        Mock::given(method("GET"))
            .and(path("/userprofiles"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": [
                {"profileId": "58", "userName": "acme_reporting", "accountName": "Acme"},
                {"profileId": "99", "userName": "unused"}
            ]})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/oauth2/v2/userinfo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "1099", "email": "ana@acme.test", "name": "Ana"
            })))
            .mount(&server)
            .await;

        let source = source(
            &server,
            &dir,
            vec![ReportRef::new("58", "101"), ReportRef::new("58", "102"), ReportRef::new("77", "1")],
        )
        .await;
        let accounts = source.list_sub_accounts().await.unwrap();
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].name, "acme_reporting");
        assert_eq!(accounts[1].name, "");

        let info = source.describe_connection().await.unwrap();
        assert_eq!(info.login_account, "ana@acme.test");
        assert_eq!(info.num_sub_account, 2);
    }
}
