//! LinkedIn Marketing API connector.
//!
//! Campaign analytics are requested one campaign at a time with
//! `timeGranularity=ALL`. LinkedIn caps a request at 20 metric fields, so
//! wider metric sets are split across requests and merged back together.

mod api;
mod config;
mod descriptor;
mod fetcher;
pub(crate) mod parser;

pub use api::{AdAccount, Campaign, LINKEDIN_API_BASE, LinkedInClient, Money};
pub use config::{ClientCredentials, LinkedInConfig, QueryType};
pub use descriptor::linkedin_descriptor;
pub use fetcher::LinkedInSource;
