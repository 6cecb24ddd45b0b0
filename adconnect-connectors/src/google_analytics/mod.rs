//! Google Analytics connector (Reporting API v4).
//!
//! Accounts are view ids. Each report is broken down by day and by
//! source/medium.

mod api;
mod config;
mod descriptor;
mod fetcher;
pub(crate) mod parser;

pub use api::{AnalyticsClient, MANAGEMENT_API_BASE, REPORTING_API_BASE, View};
pub use config::GoogleAnalyticsConfig;
pub use descriptor::google_analytics_descriptor;
pub use fetcher::GoogleAnalyticsSource;
