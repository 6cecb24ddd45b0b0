//! Client for the Trends web endpoints.

use std::time::Duration;

use adconnect_core::DateRange;
use adconnect_fetch::{Backoff, FetchError, HttpClient, RetryStrategy};
use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, instrument};

use super::config::Resolution;

// ============================================================================
// Constants
// ============================================================================

/// Trends site root.
pub const TRENDS_BASE: &str = "https://trends.google.com";

const HOST_LANGUAGE: &str = "en-US";

/// Timezone offset in minutes, as the web UI sends it.
const TZ_OFFSET: &str = "360";

/// Trends answers throttled clients with 429; back off 60s, 65s, 70s.
pub fn trends_retry() -> RetryStrategy {
    RetryStrategy::new(4)
        .with_base_delay(Duration::from_secs(60))
        .with_backoff(Backoff::Linear(Duration::from_secs(5)))
        .with_max_delay(Duration::from_secs(120))
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct ExploreResponse {
    #[serde(default)]
    widgets: Vec<Widget>,
}

#[derive(Debug, Clone, Deserialize)]
struct Widget {
    id: String,
    token: String,
    request: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct WidgetEnvelope<T> {
    default: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Timeline {
    #[serde(default)]
    timeline_data: Vec<TimelinePoint>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeoMap {
    #[serde(default)]
    geo_map_data: Vec<GeoPoint>,
}

/// One point of an interest-over-time series.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelinePoint {
    /// Unix seconds of the bucket start.
    pub time: String,
    /// Interest per keyword, 0 to 100.
    #[serde(default)]
    pub value: Vec<i64>,
    /// True for a bucket that is still filling.
    #[serde(default)]
    pub is_partial: bool,
}

impl TimelinePoint {
    /// Day the bucket starts.
    pub fn date(&self) -> Option<NaiveDate> {
        let secs: i64 = self.time.parse().ok()?;
        DateTime::from_timestamp(secs, 0).map(|t| t.date_naive())
    }

    /// Interest of the first keyword.
    pub fn interest(&self) -> Option<i64> {
        self.value.first().copied()
    }
}

/// Interest in one region.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoPoint {
    /// ISO or DMA code; cities have none.
    #[serde(default)]
    pub geo_code: Option<String>,
    /// Region name.
    #[serde(default)]
    pub geo_name: String,
    /// Interest per keyword, 0 to 100.
    #[serde(default)]
    pub value: Vec<i64>,
}

/// Drops the anti-XSSI prefix, e.g. `)]}'`, before the JSON body.
pub(crate) fn strip_xssi(body: &str) -> &str {
    body.find('{').map_or(body, |start| &body[start..])
}

fn parse<T: DeserializeOwned>(body: &str) -> Result<T, FetchError> {
    serde_json::from_str(strip_xssi(body))
        .map_err(|e| FetchError::InvalidResponse(format!("Trends response: {e}")))
}

// ============================================================================
// Client
// ============================================================================

/// Client for one market.
#[derive(Debug, Clone)]
pub struct TrendsClient {
    http: HttpClient,
    base_url: String,
    geo: String,
}

impl TrendsClient {
    /// Creates a client for `geo` (empty for worldwide).
    pub fn new(http: HttpClient, geo: impl Into<String>) -> Self {
        Self {
            http,
            base_url: TRENDS_BASE.to_string(),
            geo: geo.into(),
        }
    }

    /// Overrides the site root.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// The market.
    pub fn geo(&self) -> &str {
        &self.geo
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T, FetchError> {
        let url = format!("{}/trends/api/{path}", self.base_url);
        let body = self
            .http
            .text(
                self.http
                    .get(&url)
                    .query(&[("hl", HOST_LANGUAGE), ("tz", TZ_OFFSET)])
                    .query(query),
            )
            .await?;
        parse(&body)
    }

    async fn widget(&self, keyword: &str, range: &DateRange, id: &str) -> Result<Widget, FetchError> {
        let req = json!({
            "comparisonItem": [{"keyword": keyword, "time": range.timeframe(), "geo": self.geo}],
            "category": 0,
            "property": ""
        })
        .to_string();
        let explore: ExploreResponse = self.get("explore", &[("req", req.as_str())]).await?;
        explore
            .widgets
            .into_iter()
            .find(|w| w.id == id)
            .ok_or_else(|| FetchError::InvalidResponse(format!("explore returned no {id} widget")))
    }

    /// Interest over time for one keyword; Trends picks the granularity
    /// from the length of the range.
    #[instrument(skip(self), fields(range = %range))]
    pub async fn interest_over_time(&self, keyword: &str, range: &DateRange) -> Result<Vec<TimelinePoint>, FetchError> {
        let widget = self.widget(keyword, range, "TIMESERIES").await?;
        let req = widget.request.to_string();
        let timeline: WidgetEnvelope<Timeline> = self
            .get(
                "widgetdata/multiline",
                &[("req", req.as_str()), ("token", widget.token.as_str())],
            )
            .await?;
        debug!(points = timeline.default.timeline_data.len(), "Timeline received");
        Ok(timeline.default.timeline_data)
    }

    /// Interest by region for one keyword.
    #[instrument(skip(self), fields(range = %range, resolution = %resolution))]
    pub async fn interest_by_region(
        &self,
        keyword: &str,
        range: &DateRange,
        resolution: Resolution,
    ) -> Result<Vec<GeoPoint>, FetchError> {
        let mut widget = self.widget(keyword, range, "GEO_MAP").await?;
        if let Some(request) = widget.request.as_object_mut() {
            request.insert("resolution".into(), resolution.as_str().into());
            request.insert("includeLowSearchVolumeGeos".into(), false.into());
        }
        let req = widget.request.to_string();
        let map: WidgetEnvelope<GeoMap> = self
            .get(
                "widgetdata/comparedgeo",
                &[("req", req.as_str()), ("token", widget.token.as_str())],
            )
            .await?;
        Ok(map.default.geo_map_data)
    }
}
