//! Trade Desk settings.

use serde::{Deserialize, Serialize};

/// Page size of report execution queries.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Trade Desk connector settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TradeDeskConfig {
    /// API login.
    pub username: Option<String>,
    /// API password.
    pub password: Option<String>,
    /// Partners to pull reports for.
    pub partner_ids: Vec<String>,
    /// Only download executions of this report schedule.
    pub report_schedule: Option<String>,
    /// Executions requested per page.
    pub page_size: u32,
}

impl Default for TradeDeskConfig {
    fn default() -> Self {
        Self {
            username: None,
            password: None,
            partner_ids: Vec::new(),
            report_schedule: None,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}
