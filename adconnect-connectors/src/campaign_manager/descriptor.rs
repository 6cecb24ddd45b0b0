//! Campaign Manager connector descriptor.

use adconnect_core::Platform;
use adconnect_fetch::{FetchContext, FetchError, ReportSource};

use super::api::DfaReportingClient;
use super::fetcher::CampaignManagerSource;
use crate::config::ConnectorsConfig;
use crate::credentials::Credentials;
use crate::descriptor::{CliConfig, ConnectorDescriptor, ConnectorMetadata};
use crate::google::GOOGLE_DOMAINS;

const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/dfareporting",
    "https://www.googleapis.com/auth/userinfo.email",
];

/// Creates the Campaign Manager descriptor.
pub fn campaign_manager_descriptor() -> ConnectorDescriptor {
    ConnectorDescriptor::builder(Platform::CampaignManager)
        .metadata(ConnectorMetadata {
            display_name: "Campaign Manager 360",
            description: "Saved reports re-run over the requested dates",
            api_url: "https://dfareporting.googleapis.com/dfareporting/v4",
            docs_url: "https://developers.google.com/doubleclick-advertisers/rest/v4/reports",
            allowed_domains: GOOGLE_DOMAINS,
            default_dimensions: &[],
        })
        .cli(CliConfig {
            name: "gcm",
            aliases: &["campaign-manager", "cm360"],
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
    let cm = &config.campaign_manager;
    if cm.reports.is_empty() {
        return Err(FetchError::Config(
            "Campaign Manager needs at least one report (--report profile_id:report_id)".into(),
        ));
    }
    let google = cm
        .oauth
        .connect(Platform::CampaignManager, SCOPES, GOOGLE_DOMAINS, ctx)?;
    Ok(Box::new(CampaignManagerSource::new(
        DfaReportingClient::new(google),
        cm.reports.clone(),
    )))
}
