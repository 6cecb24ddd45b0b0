//! Trade Desk connector descriptor.

use adconnect_core::Platform;
use adconnect_fetch::{FetchContext, FetchError, ReportSource};

use super::api::TradeDeskClient;
use super::fetcher::TradeDeskSource;
use crate::config::ConnectorsConfig;
use crate::credentials::{CredentialSpec, Credentials};
use crate::descriptor::{CliConfig, ConnectorDescriptor, ConnectorMetadata, restricted_http};

// Delivery URLs are served from the API host.
const ALLOWED_DOMAINS: &[&str] = &["thetradedesk.com"];

const CREDENTIALS: &[CredentialSpec] = &[
    CredentialSpec::plain("username", "TTD_USERNAME"),
    CredentialSpec::secret("password", "TTD_PASSWORD"),
];

/// Creates the Trade Desk descriptor.
pub fn tradedesk_descriptor() -> ConnectorDescriptor {
    ConnectorDescriptor::builder(Platform::TradeDesk)
        .metadata(ConnectorMetadata {
            display_name: "The Trade Desk",
            description: "Completed MyReports schedule executions per partner",
            api_url: "https://api.thetradedesk.com/v3",
            docs_url: "https://api.thetradedesk.com/v3/portal/api/doc/MyReports",
            allowed_domains: ALLOWED_DOMAINS,
            default_dimensions: &[],
        })
        .cli(CliConfig {
            name: "ttd",
            aliases: &["tradedesk"],
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
    let settings = &config.tradedesk;
    if settings.partner_ids.is_empty() {
        return Err(FetchError::Config(
            "no Trade Desk partner ids; pass --partner-ids or set connectors.tradedesk.partner_ids".into(),
        ));
    }

    let client = TradeDeskClient::new(
        restricted_http(&ctx.http, ALLOWED_DOMAINS),
        credentials.require("username")?,
        credentials.require("password")?,
    );
    Ok(Box::new(
        TradeDeskSource::new(client, settings.partner_ids.clone())
            .with_report_schedule(settings.report_schedule.clone())
            .with_page_size(settings.page_size),
    ))
}
