//! Google Ads connector (REST `searchStream`).
//!
//! Sub-accounts are discovered by walking the customer hierarchy below the
//! manager account. Reports are GAQL queries over the `campaign` resource.

mod api;
mod config;
mod descriptor;
mod fetcher;
pub(crate) mod gaql;

pub use api::{CustomerClient, GOOGLE_ADS_API_BASE, GoogleAdsClient};
pub use config::{GoogleAdsConfig, GoogleAdsYaml};
pub use descriptor::google_ads_descriptor;
pub use fetcher::GoogleAdsSource;
pub use gaql::build_query;
