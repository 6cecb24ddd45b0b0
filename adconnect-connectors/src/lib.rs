// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `AdConnect` Connectors
//!
//! Platform-specific report sources for `AdConnect`.
//!
//! Each platform module includes:
//!
//! - **Descriptor**: Static configuration (metadata, CLI names, credentials)
//! - **Client**: The platform's REST API
//! - **Source**: A [`ReportSource`](adconnect_fetch::ReportSource) implementation
//! - **Parser**: Response to [`ReportFrame`](adconnect_core::ReportFrame) conversion
//!
//! ## Supported Platforms (9 total)
//!
//! | Platform | CLI | Auth | Report mechanism |
//! |----------|-----|------|------------------|
//! | Facebook | `fb` | Access token | Async insights job |
//! | The Trade Desk | `ttd` | Login | Schedule execution downloads |
//! | Twitter | `twitter` | OAuth 1.0a | Daily stats per campaign |
//! | LinkedIn | `linkedin` | Bearer token | Campaign analytics |
//! | DV360 | `dv360` | Google OAuth | Bid Manager query + report |
//! | Campaign Manager | `gcm` | Google OAuth | Saved report runs |
//! | Google Ads | `google-ads` | Google OAuth + developer token | GAQL `searchStream` |
//! | Google Analytics | `google-analytics` | Google OAuth | Reporting v4 `batchGet` |
//! | Google Trends | `gt` | None | Web endpoints |
//!
//! ## Usage
//!
//! ```ignore
//! use adconnect_connectors::{ConnectorRegistry, ConnectorsConfig, CredentialResolver};
//! use adconnect_core::Platform;
//! use adconnect_fetch::FetchContext;
//!
//! let ctx = FetchContext::new();
//! let desc = ConnectorRegistry::get(Platform::Facebook).unwrap();
//! let credentials = CredentialResolver::new(ctx.keychain.clone())
//!     .resolve(desc.id, desc.credentials, &flags, &config)
//!     .await;
//! let source = desc.connect(&config, &credentials, &ctx)?;
//! let accounts = source.list_sub_accounts().await?;
//! ```

pub mod config;
pub mod credentials;
pub mod descriptor;
pub mod google;
pub mod registry;

// Platform modules
pub mod campaign_manager;
pub mod dv360;
pub mod facebook;
pub mod google_ads;
pub mod google_analytics;
pub mod google_trends;
pub mod linkedin;
pub mod tradedesk;
pub mod twitter;

// Re-export key types
pub use config::ConnectorsConfig;
pub use credentials::{CredentialResolver, CredentialSource, CredentialSpec, Credentials};
pub use descriptor::{BuildFn, CliConfig, ConnectorDescriptor, ConnectorDescriptorBuilder, ConnectorMetadata};
pub use registry::ConnectorRegistry;

// Re-export platform descriptors
pub use campaign_manager::campaign_manager_descriptor;
pub use dv360::{dv360_descriptor, dv360_source};
pub use facebook::facebook_descriptor;
pub use google_ads::google_ads_descriptor;
pub use google_analytics::google_analytics_descriptor;
pub use google_trends::google_trends_descriptor;
pub use linkedin::linkedin_descriptor;
pub use tradedesk::tradedesk_descriptor;
pub use twitter::twitter_descriptor;

// Re-export report sources for convenience
pub use campaign_manager::CampaignManagerSource;
pub use dv360::Dv360Source;
pub use facebook::FacebookSource;
pub use google_ads::GoogleAdsSource;
pub use google_analytics::GoogleAnalyticsSource;
pub use google_trends::GoogleTrendsSource;
pub use linkedin::LinkedInSource;
pub use tradedesk::TradeDeskSource;
pub use twitter::TwitterSource;
