//! Display & Video 360 connector (Bid Manager API v2).
//!
//! Every fetch creates a one-time query filtered to the advertiser, runs it,
//! polls the report until it is done, and downloads the CSV from Cloud
//! Storage.

mod api;
mod config;
mod descriptor;
mod fetcher;
pub(crate) mod parser;

pub use api::{BidManagerClient, DBM_API_BASE, REPORT_TITLE, Report, ReportKey, ReportMetadata, ReportStatus};
pub use config::{DEFAULT_REPORT_WINDOW_HOURS, Dv360Config};
pub use descriptor::{ALL_ADVERTISERS, dv360_descriptor, dv360_source};
pub use fetcher::Dv360Source;
