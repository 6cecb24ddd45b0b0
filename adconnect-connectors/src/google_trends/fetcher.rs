//! Google Trends report source.

use std::time::Duration;

use adconnect_core::{
    AccountId, ConnectionInfo, CoreError, DateRange, Platform, ReportFrame, SubAccount, last_day_of_month,
};
use adconnect_fetch::{FetchError, ReportSource, RequestGate};
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use tracing::{debug, info, instrument};

use super::api::TrendsClient;
use super::config::Resolution;
use super::parser::{region_frame, scaled_frame, series};

/// Scaled daily interest, or interest by region, per keyword.
#[derive(Debug, Clone)]
pub struct GoogleTrendsSource {
    client: TrendsClient,
    keywords: Vec<String>,
    gate: RequestGate,
    region: Option<Resolution>,
}

impl GoogleTrendsSource {
    /// Creates a source over the given keywords.
    pub fn new(client: TrendsClient, keywords: Vec<String>) -> Self {
        Self {
            client,
            keywords,
            gate: RequestGate::new(Duration::from_secs(5)),
            region: None,
        }
    }

    /// Sets the spacing between requests, across all keywords.
    #[must_use]
    pub fn with_wait_time(mut self, wait_time: Duration) -> Self {
        self.gate = RequestGate::new(wait_time);
        self
    }

    /// Reports interest by region at this resolution instead.
    #[must_use]
    pub fn with_region(mut self, resolution: Option<Resolution>) -> Self {
        self.region = resolution;
        self
    }

    async fn daily_interest(&self, keyword: &str, range: &DateRange) -> Result<ReportFrame, FetchError> {
        let span = whole_months(range)?;
        self.gate.wait().await;
        let monthly = series(&self.client.interest_over_time(keyword, &span).await?);

        let mut daily = std::collections::BTreeMap::new();
        for month in &span.months() {
            self.gate.wait().await;
            debug!(month = %month, "Fetching daily interest");
            daily.extend(series(&self.client.interest_over_time(keyword, month).await?));
        }

        Ok(scaled_frame(keyword, &daily, &monthly, range))
    }
}

/// Widens a range to the first and last day of its months.
fn whole_months(range: &DateRange) -> Result<DateRange, CoreError> {
    let start = range.start();
    let end = range.end();
    let first = NaiveDate::from_ymd_opt(start.year(), start.month(), 1);
    let last = last_day_of_month(end.year(), end.month());
    match (first, last) {
        (Some(first), Some(last)) => DateRange::new(first, last),
        _ => Err(CoreError::InvalidDateRange(format!("cannot widen {range} to whole months"))),
    }
}

#[async_trait]
impl ReportSource for GoogleTrendsSource {
    fn platform(&self) -> Platform {
        Platform::GoogleTrends
    }

    async fn list_sub_accounts(&self) -> Result<Vec<SubAccount>, FetchError> {
        Ok(self
            .keywords
            .iter()
            .map(|k| SubAccount::new(k.as_str(), k.as_str()))
            .collect())
    }

    async fn describe_connection(&self) -> Result<ConnectionInfo, FetchError> {
        let geo = if self.client.geo().is_empty() {
            "worldwide"
        } else {
            self.client.geo()
        };
        Ok(ConnectionInfo::new(Platform::GoogleTrends, format!("anonymous ({geo})"))
            .with_sub_accounts(self.keywords.len()))
    }

    #[instrument(skip(self, _dimensions), fields(keyword = %account, range = %range))]
    async fn fetch_report(
        &self,
        account: &AccountId,
        range: &DateRange,
        _dimensions: &[String],
    ) -> Result<ReportFrame, FetchError> {
        let keyword = account.as_str();
        let frame = match self.region {
            Some(resolution) => {
                self.gate.wait().await;
                let points = self
                    .client
                    .interest_by_region(keyword, range, resolution)
                    .await?;
                region_frame(keyword, &points)
            }
            None => self.daily_interest(keyword, range).await?,
        };

        info!(rows = frame.len(), "Fetched Google Trends interest");
        Ok(frame.tagged(account.clone()))
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
    use wiremock::matchers::{method, path, query_param, query_param_contains};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const XSSI: &str = ")]}'\n";

    fn day_secs(day: &str) -> String {
        NaiveDate::parse_from_str(day, "%Y-%m-%d")
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc()
            .timestamp()
            .to_string()
    }

    fn timeline(points: &[(&str, i64)]) -> String {
        let data: Vec<_> = points
            .iter()
            .map(|(day, v)| serde_json::json!({"time": day_secs(day), "value": [v], "hasData": [true]}))
            .collect();
        format!("{XSSI}{}", serde_json::json!({"default": {"timelineData": data}}))
    }

    async fn mount_explore(server: &MockServer, timeframe: &str, token: &str) {
        let body = serde_json::json!({"widgets": [
            {"id": "TIMESERIES", "token": token, "request": {"time": timeframe}},
            {"id": "GEO_MAP", "token": format!("{token}-geo"), "request": {"time": timeframe}}
        ]});
        Mock::given(method("GET"))
            .and(path("/trends/api/explore"))
            .and(query_param("hl", "en-US"))
            .and(query_param_contains("req", timeframe))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!("{XSSI}{body}")))
            .mount(server)
            .await;
    }

    fn source(server: &MockServer) -> GoogleTrendsSource {
        GoogleTrendsSource::new(
            TrendsClient::new(HttpClient::new(), "US").with_base_url(server.uri()),
            vec!["tesla".into()],
        )
        .with_wait_time(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_daily_interest_is_scaled_per_month() {
        let server = MockServer::start().await;
        mount_explore(&server, "2022-01-01 2022-02-28", "t-all").await;
        mount_explore(&server, "2022-01-01 2022-01-31", "t-jan").await;
        mount_explore(&server, "2022-02-01 2022-02-28", "t-feb").await;

        for (token, body) in [
            ("t-all", timeline(&[("2022-01-01", 50), ("2022-02-01", 100)])),
            ("t-jan", timeline(&[("2022-01-30", 100), ("2022-01-31", 60)])),
            ("t-feb", timeline(&[("2022-02-01", 30), ("2022-02-02", 90)])),
        ] {
            Mock::given(method("GET"))
                .and(path("/trends/api/widgetdata/multiline"))
                .and(query_param("token", token))
                .respond_with(ResponseTemplate::new(200).set_body_string(body))
                .expect(1)
                .mount(&server)
                .await;
        }

        let range = DateRange::parse("2022-01-31", "2022-02-01").unwrap();
        let frame = source(&server)
            .fetch_report(&AccountId::new("tesla"), &range, &[])
            .await
            .unwrap();

        assert_eq!(frame.len(), 2);
        assert_eq!(frame.get(0, "date"), Some(&Value::Text("2022-01-31".into())));
        assert_eq!(frame.get(0, "tesla"), Some(&Value::Float(30.0)));
        assert_eq!(frame.get(1, "tesla_monthly"), Some(&Value::Int(100)));
        assert_eq!(frame.get(1, "tesla"), Some(&Value::Float(30.0)));
    }

    #[tokio::test]
    async fn test_region_mode() {
        let server = MockServer::start().await;
        mount_explore(&server, "2022-03-01 2022-03-31", "t").await;
        Mock::given(method("GET"))
            .and(path("/trends/api/widgetdata/comparedgeo"))
            .and(query_param("token", "t-geo"))
            .and(query_param_contains("req", "\"resolution\":\"REGION\""))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                "{XSSI}{}",
                serde_json::json!({"default": {"geoMapData": [
                    {"geoCode": "US-CA", "geoName": "California", "value": [100]},
                    {"geoCode": "US-TX", "geoName": "Texas", "value": [64]}
                ]}})
            )))
            .mount(&server)
            .await;

        let range = DateRange::parse("2022-03-01", "2022-03-31").unwrap();
        let frame = source(&server)
            .with_region(Some(Resolution::Region))
            .fetch_report(&AccountId::new("tesla"), &range, &[])
            .await
            .unwrap();

        assert_eq!(frame.len(), 2);
        assert_eq!(frame.get(1, "geo_name"), Some(&Value::Text("Texas".into())));
        assert_eq!(frame.get(1, "tesla"), Some(&Value::Int(64)));
    }

    #[tokio::test]
    async fn test_keywords_are_accounts() {
        let server = MockServer::start().await;
        let source = source(&server);
        let accounts = source.list_sub_accounts().await.unwrap();
        assert_eq!(accounts[0].id.as_str(), "tesla");
        assert_eq!(source.describe_connection().await.unwrap().login_account, "anonymous (US)");
    }

    #[test]
    fn test_whole_months() {
        let range = DateRange::parse("2022-01-15", "2022-02-03").unwrap();
        assert_eq!(whole_months(&range).unwrap().timeframe(), "2022-01-01 2022-02-28");
    }
}
