//! Campaign Manager 360 connector (DCM/DFA Reporting API v4).
//!
//! Reports are defined in the Campaign Manager UI and referenced here as
//! `profile_id:report_id` pairs. Each fetch moves the report's date range,
//! runs it, waits for the file, and downloads it.

mod api;
mod config;
mod descriptor;
mod fetcher;
pub(crate) mod parser;

pub use api::{DFA_API_BASE, DfaReportingClient, ReportFile, UserProfile};
pub use config::{CampaignManagerConfig, ReportRef};
pub use descriptor::campaign_manager_descriptor;
pub use fetcher::CampaignManagerSource;
