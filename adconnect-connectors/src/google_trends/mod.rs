//! Google Trends connector.
//!
//! Trends has no official API; this talks to the endpoints the web UI uses.
//! Each keyword is treated as an account. Daily interest is fetched month by
//! month and rescaled against a single monthly series so values stay
//! comparable across months.

mod api;
mod config;
mod descriptor;
mod fetcher;
pub(crate) mod parser;

pub use api::{GeoPoint, TRENDS_BASE, TimelinePoint, TrendsClient, trends_retry};
pub use config::{GoogleTrendsConfig, Resolution};
pub use descriptor::google_trends_descriptor;
pub use fetcher::GoogleTrendsSource;
