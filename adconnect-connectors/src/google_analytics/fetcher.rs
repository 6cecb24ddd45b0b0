//! Google Analytics report source.

use adconnect_core::{AccountId, ConnectionInfo, DateRange, Platform, ReportFrame, SubAccount};
use adconnect_fetch::{FetchError, ReportSource};
use async_trait::async_trait;
use tracing::{info, instrument};

use super::api::AnalyticsClient;
use super::descriptor::{DEFAULT_METRICS, REPORT_DIMENSIONS};
use super::parser::{metric_expression, report_frame};

/// Daily traffic metrics per view.
#[derive(Debug, Clone)]
pub struct GoogleAnalyticsSource {
    client: AnalyticsClient,
    view_ids: Vec<String>,
}

impl GoogleAnalyticsSource {
    /// Creates a source; an empty view list means every readable view.
    pub fn new(client: AnalyticsClient, view_ids: Vec<String>) -> Self {
        Self { client, view_ids }
    }
}

#[async_trait]
impl ReportSource for GoogleAnalyticsSource {
    fn platform(&self) -> Platform {
        Platform::GoogleAnalytics
    }

    fn default_dimensions(&self) -> Vec<String> {
        DEFAULT_METRICS.iter().map(ToString::to_string).collect()
    }

    async fn list_sub_accounts(&self) -> Result<Vec<SubAccount>, FetchError> {
        let views = self.client.views().await?;
        Ok(views
            .into_iter()
            .filter(|v| self.view_ids.is_empty() || self.view_ids.contains(&v.id))
            .map(|v| {
                let account = SubAccount::new(v.id, v.name);
                match v.currency {
                    Some(currency) => account.with_currency(currency),
                    None => account,
                }
            })
            .collect())
    }

    async fn describe_connection(&self) -> Result<ConnectionInfo, FetchError> {
        let user = self.client.google().auth().user_info().await?;
        let views = self.list_sub_accounts().await?;
        Ok(ConnectionInfo::new(Platform::GoogleAnalytics, user.email)
            .with_login_account_id(user.id)
            .with_sub_accounts(views.len()))
    }

    #[instrument(skip(self, dimensions), fields(view = %account, range = %range))]
    async fn fetch_report(
        &self,
        account: &AccountId,
        range: &DateRange,
        dimensions: &[String],
    ) -> Result<ReportFrame, FetchError> {
        let metrics: Vec<String> = if dimensions.is_empty() {
            self.default_dimensions()
        } else {
            dimensions.iter().map(|m| metric_expression(m)).collect()
        };

        let pages = self
            .client
            .report(account.as_str(), range, &metrics, REPORT_DIMENSIONS)
            .await?;
        let frame = report_frame(&pages).tagged(account.clone());

        info!(pages = pages.len(), rows = frame.len(), "Fetched Google Analytics report");
        Ok(frame)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::google::testing::{TEST_TOKEN, authorized_client};
    use adconnect_core::Value;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn source(server: &MockServer, dir: &std::path::Path, views: Vec<String>) -> GoogleAnalyticsSource {
        let google = authorized_client(dir, &server.uri()).await;
        GoogleAnalyticsSource::new(AnalyticsClient::new(google).with_base_url(server.uri()), views)
    }

    #[tokio::test]
    async fn test_fetch_report() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/reports:batchGet"))
            .and(header("Authorization", format!("Bearer {TEST_TOKEN}").as_str()))
            .and(body_partial_json(json!({"reportRequests": [{
                "viewId": "107519727",
                "dateRanges": [{"startDate": "2022-01-01", "endDate": "2022-01-02"}],
                "metrics": [{"expression": "ga:users"}, {"expression": "ga:sessions"}],
                "dimensions": [{"name": "ga:date"}, {"name": "ga:sourceMedium"}]
            }]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"reports": [{
                "columnHeader": {
                    "dimensions": ["ga:date", "ga:sourceMedium"],
                    "metricHeader": {"metricHeaderEntries": [{"name": "ga:users"}, {"name": "ga:sessions"}]}
                },
                "data": {"rows": [
                    {"dimensions": ["20220101", "google / organic"], "metrics": [{"values": ["5", "7"]}]}
                ]}
            }]})))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let range = DateRange::parse("2022-01-01", "2022-01-02").unwrap();
        let frame = source(&server, dir.path(), Vec::new())
            .await
            .fetch_report(&AccountId::new("107519727"), &range, &["users".into(), "ga:sessions".into()])
            .await
            .unwrap();

        assert_eq!(frame.account().map(AccountId::as_str), Some("107519727"));
        assert_eq!(frame.get(0, "sessions"), Some(&Value::Int(7)));
        assert_eq!(frame.get(0, "date"), Some(&Value::Text("2022-01-01".into())));
    }

    #[tokio::test]
    async fn test_views_filtered_by_config() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/management/accounts/~all/webproperties/~all/profiles"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": [
                {"id": "1", "name": "All Web Site Data", "currency": "USD", "webPropertyId": "UA-1-1"},
                {"id": "2", "name": "Staging", "webPropertyId": "UA-1-2"}
            ]})))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let all = source(&server, dir.path(), Vec::new()).await.list_sub_accounts().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].currency.as_deref(), Some("USD"));

        let picked = source(&server, dir.path(), vec!["2".into()])
            .await
            .list_sub_accounts()
            .await
            .unwrap();
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].name, "Staging");
    }
}
