//! Google Trends settings.

use std::fmt;
use std::str::FromStr;

use adconnect_fetch::FetchError;
use serde::{Deserialize, Serialize};

/// Default market.
pub const DEFAULT_GEO: &str = "US";

/// Default pause between monthly daily-series requests.
pub const DEFAULT_WAIT_TIME_SECS: f64 = 5.0;

/// Granularity of interest-by-region results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Resolution {
    /// Countries.
    Country,
    /// States or provinces.
    Region,
    /// Cities.
    #[default]
    City,
    /// Nielsen DMA metro areas (US only).
    Dma,
}

impl Resolution {
    /// Name sent to the API.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Country => "COUNTRY",
            Self::Region => "REGION",
            Self::City => "CITY",
            Self::Dma => "DMA",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resolution {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "COUNTRY" => Ok(Self::Country),
            "REGION" => Ok(Self::Region),
            "CITY" => Ok(Self::City),
            "DMA" => Ok(Self::Dma),
            other => Err(FetchError::Config(format!(
                "unknown resolution {other}; expected COUNTRY, REGION, CITY or DMA"
            ))),
        }
    }
}

/// Google Trends connector settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleTrendsConfig {
    /// Keywords to report on.
    pub keywords: Vec<String>,
    /// Market, e.g. `US` or `US-CA`; empty means worldwide.
    pub geo: String,
    /// Seconds to wait between monthly requests.
    pub wait_time_secs: f64,
    /// Report interest by region instead of the daily series.
    pub region: bool,
    /// Region granularity.
    pub resolution: Resolution,
}

impl Default for GoogleTrendsConfig {
    fn default() -> Self {
        Self {
            keywords: Vec::new(),
            geo: DEFAULT_GEO.to_string(),
            wait_time_secs: DEFAULT_WAIT_TIME_SECS,
            region: false,
            resolution: Resolution::default(),
        }
    }
}
