//! Twitter Ads connector descriptor.

use adconnect_core::Platform;
use adconnect_fetch::{FetchContext, FetchError, ReportSource};

use super::api::TwitterClient;
use super::fetcher::TwitterSource;
use super::oauth::OAuth1Credentials;
use crate::config::ConnectorsConfig;
use crate::credentials::{CredentialSpec, Credentials};
use crate::descriptor::{CliConfig, ConnectorDescriptor, ConnectorMetadata, restricted_http};

/// Metric groups requested when none are given.
pub(crate) const DEFAULT_METRIC_GROUPS: &[&str] = &["ENGAGEMENT", "BILLING", "VIDEO"];

const ALLOWED_DOMAINS: &[&str] = &["ads-api.twitter.com", "api.twitter.com"];

const CREDENTIALS: &[CredentialSpec] = &[
    CredentialSpec::plain("consumer_key", "TWITTER_CONSUMER_KEY"),
    CredentialSpec::secret("consumer_secret", "TWITTER_CONSUMER_SECRET"),
    CredentialSpec::secret("access_token", "TWITTER_ACCESS_TOKEN"),
    CredentialSpec::secret("access_token_secret", "TWITTER_ACCESS_TOKEN_SECRET"),
];

/// Creates the Twitter Ads descriptor.
pub fn twitter_descriptor() -> ConnectorDescriptor {
    ConnectorDescriptor::builder(Platform::Twitter)
        .metadata(ConnectorMetadata {
            display_name: "Twitter Ads",
            description: "Daily campaign stats with derived result metrics",
            api_url: "https://ads-api.twitter.com/12",
            docs_url: "https://developer.twitter.com/en/docs/twitter-ads-api/analytics/api-reference/synchronous",
            allowed_domains: ALLOWED_DOMAINS,
            default_dimensions: DEFAULT_METRIC_GROUPS,
        })
        .cli(CliConfig {
            name: "twitter",
            aliases: &["tw"],
        })
        .credentials(CREDENTIALS)
        .build_with(build)
        .build()
}

fn build(
    _config: &ConnectorsConfig,
    credentials: &Credentials,
    ctx: &FetchContext,
) -> Result<Box<dyn ReportSource>, FetchError> {
    let oauth = OAuth1Credentials {
        consumer_key: credentials.require("consumer_key")?.to_string(),
        consumer_secret: credentials.require("consumer_secret")?.to_string(),
        token: credentials.require("access_token")?.to_string(),
        token_secret: credentials.require("access_token_secret")?.to_string(),
    };
    let client = TwitterClient::new(restricted_http(&ctx.http, ALLOWED_DOMAINS), oauth);
    Ok(Box::new(TwitterSource::new(client)))
}
