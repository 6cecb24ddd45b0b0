//! Google Trends connector descriptor.

use std::time::Duration;

use adconnect_core::Platform;
use adconnect_fetch::{FetchContext, FetchError, ReportSource};

use super::api::{TrendsClient, trends_retry};
use super::fetcher::GoogleTrendsSource;
use crate::config::ConnectorsConfig;
use crate::credentials::Credentials;
use crate::descriptor::{CliConfig, ConnectorDescriptor, ConnectorMetadata, restricted_http};

const ALLOWED_DOMAINS: &[&str] = &["trends.google.com"];

/// Creates the Google Trends descriptor.
pub fn google_trends_descriptor() -> ConnectorDescriptor {
    ConnectorDescriptor::builder(Platform::GoogleTrends)
        .metadata(ConnectorMetadata {
            display_name: "Google Trends",
            description: "Daily search interest per keyword, scaled across months",
            api_url: "https://trends.google.com/trends/api",
            docs_url: "https://support.google.com/trends/answer/4365533",
            allowed_domains: ALLOWED_DOMAINS,
            default_dimensions: &[],
        })
        .cli(CliConfig {
            name: "gt",
            aliases: &["trends"],
        })
        .build_with(build)
        .build()
}

fn build(
    config: &ConnectorsConfig,
    _credentials: &Credentials,
    ctx: &FetchContext,
) -> Result<Box<dyn ReportSource>, FetchError> {
    let trends = &config.google_trends;
    if trends.keywords.is_empty() {
        return Err(FetchError::Config(
            "Google Trends needs at least one keyword (-k/--keyword)".into(),
        ));
    }
    let wait_time = Duration::try_from_secs_f64(trends.wait_time_secs)
        .map_err(|e| FetchError::Config(format!("invalid wait time {}: {e}", trends.wait_time_secs)))?;

    let http = restricted_http(&ctx.http, ALLOWED_DOMAINS).with_retry(trends_retry());
    let source = GoogleTrendsSource::new(TrendsClient::new(http, trends.geo.as_str()), trends.keywords.clone())
        .with_wait_time(wait_time)
        .with_region(trends.region.then_some(trends.resolution));
    Ok(Box::new(source))
}
