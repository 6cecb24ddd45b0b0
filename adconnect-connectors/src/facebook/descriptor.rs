//! Facebook connector descriptor.

use adconnect_core::Platform;
use adconnect_fetch::{FetchContext, FetchError, ReportSource};

use super::api::GraphClient;
use super::fetcher::FacebookSource;
use crate::config::ConnectorsConfig;
use crate::credentials::{CredentialSpec, Credentials};
use crate::descriptor::{CliConfig, ConnectorDescriptor, ConnectorMetadata, restricted_http};

/// Insights fields requested when none are given.
pub(crate) const DEFAULT_FIELDS: &[&str] = &[
    "account_id",
    "account_name",
    "account_currency",
    "impressions",
    "reach",
    "frequency",
    "clicks",
    "unique_clicks",
    "ctr",
    "cpc",
    "cpm",
    "spend",
    "date_start",
    "date_stop",
];

const ALLOWED_DOMAINS: &[&str] = &["graph.facebook.com"];

const CREDENTIALS: &[CredentialSpec] = &[CredentialSpec::secret("access_token", "FB_ACCESS_TOKEN")];

/// Creates the Facebook descriptor.
pub fn facebook_descriptor() -> ConnectorDescriptor {
    ConnectorDescriptor::builder(Platform::Facebook)
        .metadata(ConnectorMetadata {
            display_name: "Facebook",
            description: "Daily account-level insights from the Marketing API",
            api_url: "https://graph.facebook.com/v17.0",
            docs_url: "https://developers.facebook.com/docs/marketing-api/reference/ads-insights/",
            allowed_domains: ALLOWED_DOMAINS,
            default_dimensions: DEFAULT_FIELDS,
        })
        .cli(CliConfig {
            name: "fb",
            aliases: &["facebook"],
        })
        .credentials(CREDENTIALS)
        .build_with(build)
        .build()
}

fn build(
    config: &ConnectorsConfig,
    credentials: &Credentials,
    ctx: &FetchContext,
) -> Result<Box<dyn ReportSource>, FetchError> {
    let token = credentials.require("access_token")?;
    let http = restricted_http(&ctx.http, ALLOWED_DOMAINS);
    let api = GraphClient::new(http, token, config.facebook.api_version.as_str());
    Ok(Box::new(FacebookSource::new(api)))
}
