//! Twitter Ads connector.
//!
//! Campaign statistics come from the synchronous stats endpoint, one day at
//! a time, for at most 20 campaigns per request. Every request is signed
//! with OAuth 1.0a.

mod api;
mod config;
mod descriptor;
mod fetcher;
pub(crate) mod oauth;
pub(crate) mod parser;

pub use api::{ADS_API_BASE, Campaign, LineItem, StatsEntry, TwitterClient, USER_API_BASE};
pub use config::TwitterConfig;
pub use descriptor::twitter_descriptor;
pub use fetcher::TwitterSource;
pub use oauth::OAuth1Credentials;
