//! The Trade Desk connector.
//!
//! TTD reports are produced by schedules configured in the TTD UI. This
//! connector finds the completed executions of those schedules for a
//! partner and downloads their CSV deliveries.

mod api;
mod config;
mod descriptor;
mod error;
mod fetcher;

pub use api::{ReportDelivery, ReportExecution, TTD_API_BASE, TradeDeskClient};
pub use config::TradeDeskConfig;
pub use descriptor::tradedesk_descriptor;
pub use error::TradeDeskError;
pub use fetcher::TradeDeskSource;
