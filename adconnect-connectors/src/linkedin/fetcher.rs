//! LinkedIn report source.

use std::time::Duration;

use adconnect_core::{AccountId, ConnectionInfo, DateRange, Platform, ReportFrame, SubAccount};
use adconnect_fetch::{FetchError, ReportSource, RequestGate};
use async_trait::async_trait;
use tracing::{debug, info, instrument};

use super::api::LinkedInClient;
use super::config::{DEFAULT_REQUEST_INTERVAL_MS, QueryType};
use super::descriptor::DEFAULT_METRICS;
use super::parser::{field_chunks, merge_elements, push_campaign_rows};

/// Campaign analytics per sponsored account.
#[derive(Debug, Clone)]
pub struct LinkedInSource {
    client: LinkedInClient,
    query_type: QueryType,
    gate: RequestGate,
}

impl LinkedInSource {
    /// Creates a source with daily rows and the default request pacing.
    pub fn new(client: LinkedInClient) -> Self {
        Self {
            client,
            query_type: QueryType::Day,
            gate: RequestGate::new(Duration::from_millis(DEFAULT_REQUEST_INTERVAL_MS)),
        }
    }

    /// Sets the period column added to rows.
    #[must_use]
    pub fn with_query_type(mut self, query_type: QueryType) -> Self {
        self.query_type = query_type;
        self
    }

    /// Sets the spacing between analytics requests, across all accounts.
    #[must_use]
    pub fn with_request_interval(mut self, interval: Duration) -> Self {
        self.gate = RequestGate::new(interval);
        self
    }
}

#[async_trait]
impl ReportSource for LinkedInSource {
    fn platform(&self) -> Platform {
        Platform::LinkedIn
    }

    fn default_dimensions(&self) -> Vec<String> {
        DEFAULT_METRICS.iter().map(ToString::to_string).collect()
    }

    async fn list_sub_accounts(&self) -> Result<Vec<SubAccount>, FetchError> {
        Ok(self
            .client
            .ad_accounts()
            .await?
            .into_iter()
            .map(|a| {
                let account = SubAccount::new(a.id.to_string(), a.name);
                match a.currency {
                    Some(currency) => account.with_currency(currency),
                    None => account,
                }
            })
            .collect())
    }

    async fn describe_connection(&self) -> Result<ConnectionInfo, FetchError> {
        let (id, name) = self.client.me().await?;
        let accounts = self.client.ad_accounts().await?;
        Ok(ConnectionInfo::new(Platform::LinkedIn, name)
            .with_login_account_id(id)
            .with_sub_accounts(accounts.len()))
    }

    #[instrument(skip(self, dimensions), fields(account = %account, range = %range))]
    async fn fetch_report(
        &self,
        account: &AccountId,
        range: &DateRange,
        dimensions: &[String],
    ) -> Result<ReportFrame, FetchError> {
        let metrics = if dimensions.is_empty() {
            self.default_dimensions()
        } else {
            dimensions.to_vec()
        };
        let chunks = field_chunks(&metrics);

        let details = self.client.ad_account(account.as_str()).await?;
        let campaigns: Vec<_> = self
            .client
            .campaigns(account.as_str())
            .await?
            .into_iter()
            .filter(|c| c.status != "DRAFT")
            .collect();
        debug!(campaigns = campaigns.len(), "Listed non-draft campaigns");

        let mut frame = ReportFrame::for_account(account.clone());
        for campaign in &campaigns {
            let mut responses = Vec::with_capacity(chunks.len());
            for fields in &chunks {
                self.gate.wait().await;
                responses.push(
                    self.client
                        .campaign_analytics(campaign.id, range, fields)
                        .await?,
                );
            }
            let elements = merge_elements(responses);
            push_campaign_rows(
                &mut frame,
                &details,
                campaign,
                &elements,
                range,
                self.query_type,
                &metrics,
            );
        }

        info!(campaigns = campaigns.len(), rows = frame.len(), "Fetched LinkedIn analytics");
        Ok(frame)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use adconnect_core::Value;
    use adconnect_fetch::HttpClient;
    use serde_json::json;
    use adconnect_fetch::ReportAggregator;
    use std::sync::{Arc, Mutex};
    use std::time::Instant;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

    /// Answers analytics requests and records when each one arrived.
    #[derive(Clone, Default)]
    struct Arrivals(Arc<Mutex<Vec<Instant>>>);

    impl Respond for Arrivals {
        fn respond(&self, _: &Request) -> ResponseTemplate {
            self.0.lock().unwrap().push(Instant::now());
            ResponseTemplate::new(200).set_body_json(json!({"elements": [{"impressions": 10}]}))
        }
    }

    fn source(server: &MockServer) -> LinkedInSource {
        let client = LinkedInClient::new(HttpClient::new(), "AQX-token").with_base_url(server.uri());
        LinkedInSource::new(client).with_request_interval(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_fetch_merges_field_chunks() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/adAccountsV2/5021"))
            .and(header("Authorization", "Bearer AQX-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 5021, "name": "Acme", "currency": "USD"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/adCampaignsV2"))
            .and(query_param("search.account.values[0]", "urn:li:sponsoredAccount:5021"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"elements": [
                {"id": 1, "name": "Draft", "status": "DRAFT", "objectiveType": "WEBSITE_VISIT"},
                {"id": 2, "name": "Visits", "status": "ACTIVE", "objectiveType": "WEBSITE_VISIT",
                 "dailyBudget": {"amount": "20", "currencyCode": "USD"}}
            ]})))
            .mount(&server)
            .await;

        let metrics: Vec<String> = (0..21).map(|i| format!("m{i}")).collect();
        Mock::given(method("GET"))
            .and(path("/adAnalyticsV2"))
            .and(query_param("campaigns[0]", "urn:li:sponsoredCampaign:2"))
            .and(query_param("dateRange.start.month", "7"))
            .and(query_param("fields", "m20"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"elements": [{"m20": 7}]})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/adAnalyticsV2"))
            .and(query_param("campaigns[0]", "urn:li:sponsoredCampaign:2"))
            .and(query_param("timeGranularity", "ALL"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"elements": [{"m0": 100, "m1": 3}]})))
            .expect(1)
            .mount(&server)
            .await;

        let range = DateRange::parse("2020-07-05", "2020-07-11").unwrap();
        let frame = source(&server)
            .with_query_type(QueryType::Week)
            .fetch_report(&AccountId::new("5021"), &range, &metrics)
            .await
            .unwrap();

        assert_eq!(frame.len(), 1);
        assert_eq!(frame.get(0, "campaign_id"), Some(&Value::Int(2)));
        assert_eq!(frame.get(0, "campaign_type"), Some(&Value::Text("off_site".into())));
        assert_eq!(frame.get(0, "currency"), Some(&Value::Text("USD".into())));
        assert_eq!(frame.get(0, "week_number"), Some(&Value::Int(28)));
        assert_eq!(frame.get(0, "m0"), Some(&Value::Int(100)));
        assert_eq!(frame.get(0, "m20"), Some(&Value::Int(7)));
        assert_eq!(frame.get(0, "m5"), Some(&Value::Text(String::new())));
    }

    #[tokio::test]
    async fn test_request_interval_spans_accounts() {
        let server = MockServer::start().await;
        for id in ["5021", "5022"] {
            Mock::given(method("GET"))
                .and(path(format!("/adAccountsV2/{id}")))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "id": id.parse::<i64>().unwrap(), "name": "Acme", "currency": "USD"
                })))
                .mount(&server)
                .await;
        }
        Mock::given(method("GET"))
            .and(path("/adCampaignsV2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"elements": [
                {"id": 2, "name": "Visits", "status": "ACTIVE", "objectiveType": "WEBSITE_VISIT"}
            ]})))
            .mount(&server)
            .await;
        let arrivals = Arrivals::default();
        Mock::given(method("GET"))
            .and(path("/adAnalyticsV2"))
            .respond_with(arrivals.clone())
            .mount(&server)
            .await;

        let interval = Duration::from_millis(200);
        let source = source(&server)
            .with_query_type(QueryType::Week)
            .with_request_interval(interval);
        let accounts = vec![AccountId::new("5021"), AccountId::new("5022")];
        let range = DateRange::parse("2020-07-05", "2020-07-11").unwrap();
        let outcome = ReportAggregator::new()
            .run(&source, &accounts, &range, &["impressions".to_string()])
            .await
            .unwrap();
        assert_eq!(outcome.frame.len(), 2);

        let mut times = arrivals.0.lock().unwrap().clone();
        times.sort();
        assert!(times.len() >= 2);
        for pair in times.windows(2) {
            let gap = pair[1] - pair[0];
            assert!(gap >= interval - Duration::from_millis(20), "requests {gap:?} apart");
        }
    }

    #[tokio::test]
    async fn test_accounts_and_describe() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/adAccountsV2"))
            .and(query_param("search.type.values[0]", "BUSINESS"))
            .and(query_param("search.status.values[0]", "ACTIVE"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"elements": [
                {"id": 5021, "name": "Acme", "currency": "USD"},
                {"id": 5022, "name": "Globex"}
            ]})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "yrZCpj2Z12", "localizedFirstName": "Bob", "localizedLastName": "Smith"
            })))
            .mount(&server)
            .await;

        let source = source(&server);
        let accounts = source.list_sub_accounts().await.unwrap();
        assert_eq!(accounts[0].id.as_str(), "5021");
        assert_eq!(accounts[0].currency.as_deref(), Some("USD"));
        assert_eq!(accounts[1].currency, None);

        let info = source.describe_connection().await.unwrap();
        assert_eq!(info.login_account, "Bob Smith");
        assert_eq!(info.num_sub_account, 2);
    }

    #[tokio::test]
    async fn test_expired_token_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/me"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "serviceErrorCode": 65601, "message": "The token used in the request has been revoked", "status": 401
            })))
            .mount(&server)
            .await;

        let err = source(&server).describe_connection().await.unwrap_err();
        assert!(err.is_fatal());
    }
}
