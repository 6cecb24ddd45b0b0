//! Google Analytics connector descriptor.

use adconnect_core::Platform;
use adconnect_fetch::{FetchContext, FetchError, ReportSource};

use super::api::AnalyticsClient;
use super::fetcher::GoogleAnalyticsSource;
use crate::config::ConnectorsConfig;
use crate::credentials::Credentials;
use crate::descriptor::{CliConfig, ConnectorDescriptor, ConnectorMetadata};
use crate::google::GOOGLE_DOMAINS;

/// Metrics requested when none are given.
pub(crate) const DEFAULT_METRICS: &[&str] = &[
    "ga:users",
    "ga:newUsers",
    "ga:sessions",
    "ga:bounceRate",
    "ga:pageviewsPerSession",
    "ga:avgSessionDuration",
    "ga:goalConversionRateAll",
    "ga:goalCompletionsAll",
    "ga:goalValueAll",
];

/// Every report is broken down by these.
pub(crate) const REPORT_DIMENSIONS: &[&str] = &["ga:date", "ga:sourceMedium"];

const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/analytics.readonly",
    "https://www.googleapis.com/auth/userinfo.email",
];

/// Creates the Google Analytics descriptor.
pub fn google_analytics_descriptor() -> ConnectorDescriptor {
    ConnectorDescriptor::builder(Platform::GoogleAnalytics)
        .metadata(ConnectorMetadata {
            display_name: "Google Analytics",
            description: "Daily traffic by source/medium per view",
            api_url: "https://analyticsreporting.googleapis.com/v4",
            docs_url: "https://developers.google.com/analytics/devguides/reporting/core/v4",
            allowed_domains: GOOGLE_DOMAINS,
            default_dimensions: DEFAULT_METRICS,
        })
        .cli(CliConfig {
            name: "google-analytics",
            aliases: &["google_analyst"],
        })
        .oauth_scopes(SCOPES)
        .build_with(build)
        .build()
}

fn build(
    config: &ConnectorsConfig,
    _credentials: &Credentials,
    ctx: &FetchContext,
) -> Result<Box<dyn ReportSource>, FetchError> {
    let analytics = &config.google_analytics;
    let google = analytics
        .oauth
        .connect(Platform::GoogleAnalytics, SCOPES, GOOGLE_DOMAINS, ctx)?;
    Ok(Box::new(GoogleAnalyticsSource::new(
        AnalyticsClient::new(google),
        analytics.view_ids.clone(),
    )))
}
