//! DV360 connector descriptor.

use adconnect_core::Platform;
use adconnect_fetch::{FetchContext, FetchError, ReportSource};

use super::api::BidManagerClient;
use super::fetcher::Dv360Source;
use crate::config::ConnectorsConfig;
use crate::credentials::Credentials;
use crate::descriptor::{CliConfig, ConnectorDescriptor, ConnectorMetadata};
use crate::google::GOOGLE_DOMAINS;

/// Metrics requested when none are given.
pub(crate) const DEFAULT_METRICS: &[&str] = &["METRIC_CLICKS", "METRIC_IMPRESSIONS"];

/// Pseudo-account meaning "no advertiser filter".
pub const ALL_ADVERTISERS: &str = "*";

const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/doubleclickbidmanager",
    "https://www.googleapis.com/auth/userinfo.email",
];

/// Creates the DV360 descriptor.
pub fn dv360_descriptor() -> ConnectorDescriptor {
    ConnectorDescriptor::builder(Platform::Dv360)
        .metadata(ConnectorMetadata {
            display_name: "DV360",
            description: "One-time Bid Manager queries per advertiser",
            api_url: "https://doubleclickbidmanager.googleapis.com/v2",
            docs_url: "https://developers.google.com/bid-manager/reference/rest/v2/queries",
            allowed_domains: GOOGLE_DOMAINS,
            default_dimensions: DEFAULT_METRICS,
        })
        .cli(CliConfig {
            name: "dv360",
            aliases: &["dv"],
        })
        .oauth_scopes(SCOPES)
        .build_with(build)
        .build()
}

/// Builds the concrete source, for callers that create or fetch queries
/// directly.
pub fn dv360_source(config: &ConnectorsConfig, ctx: &FetchContext) -> Result<Dv360Source, FetchError> {
    let dv360 = &config.dv360;
    let google = dv360
        .oauth
        .connect(Platform::Dv360, SCOPES, GOOGLE_DOMAINS, ctx)?;
    Ok(Dv360Source::new(BidManagerClient::new(google), dv360.advertiser_ids.clone())
        .with_frequency(dv360.frequency.as_str())
        .with_group_bys(dv360.group_bys.clone())
        .with_report_window_hours(dv360.report_window_hours))
}

fn build(
    config: &ConnectorsConfig,
    _credentials: &Credentials,
    ctx: &FetchContext,
) -> Result<Box<dyn ReportSource>, FetchError> {
    Ok(Box::new(dv360_source(config, ctx)?))
}
