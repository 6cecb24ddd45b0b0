//! DV360 settings.

use serde::{Deserialize, Serialize};

use crate::google::GoogleOAuthConfig;

/// Reports older than this many hours are logged as stale.
pub const DEFAULT_REPORT_WINDOW_HOURS: u32 = 12;

/// DV360 connector settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dv360Config {
    /// OAuth client and token cache.
    #[serde(flatten)]
    pub oauth: GoogleOAuthConfig,
    /// Advertisers to report on; empty means one unfiltered report.
    pub advertiser_ids: Vec<String>,
    /// Schedule frequency of created queries.
    pub frequency: String,
    /// Maximum report age before a warning is logged.
    pub report_window_hours: u32,
    /// Group-bys added after date and advertiser.
    pub group_bys: Vec<String>,
}

impl Default for Dv360Config {
    fn default() -> Self {
        Self {
            oauth: GoogleOAuthConfig::default(),
            advertiser_ids: Vec::new(),
            frequency: "ONE_TIME".to_string(),
            report_window_hours: DEFAULT_REPORT_WINDOW_HOURS,
            group_bys: Vec::new(),
        }
    }
}
