//! LinkedIn connector descriptor.

use std::time::Duration;

use adconnect_core::Platform;
use adconnect_fetch::{FetchContext, FetchError, ReportSource};

use super::api::LinkedInClient;
use super::config::ClientCredentials;
use super::fetcher::LinkedInSource;
use crate::config::ConnectorsConfig;
use crate::credentials::{CredentialSpec, Credentials};
use crate::descriptor::{CliConfig, ConnectorDescriptor, ConnectorMetadata, restricted_http};

/// Analytics metrics requested when none are given.
pub(crate) const DEFAULT_METRICS: &[&str] = &[
    "impressions",
    "clicks",
    "landingPageClicks",
    "costInLocalCurrency",
    "costInUsd",
    "totalEngagements",
    "likes",
    "comments",
    "shares",
    "follows",
    "reactions",
    "otherEngagements",
    "videoViews",
    "videoCompletions",
    "oneClickLeads",
    "oneClickLeadFormOpens",
    "externalWebsiteConversions",
    "conversionValueInLocalCurrency",
    "approximateUniqueImpressions",
    "opens",
    "sends",
    "dateRange",
];

const ALLOWED_DOMAINS: &[&str] = &["api.linkedin.com"];

const CREDENTIALS: &[CredentialSpec] = &[CredentialSpec::secret("access_token", "LINKEDIN_ACCESS_TOKEN")];

/// Creates the LinkedIn descriptor.
pub fn linkedin_descriptor() -> ConnectorDescriptor {
    ConnectorDescriptor::builder(Platform::LinkedIn)
        .metadata(ConnectorMetadata {
            display_name: "LinkedIn",
            description: "Campaign analytics per sponsored account",
            api_url: "https://api.linkedin.com/v2",
            docs_url: "https://learn.microsoft.com/en-us/linkedin/marketing/integrations/ads-reporting/ads-reporting",
            allowed_domains: ALLOWED_DOMAINS,
            default_dimensions: DEFAULT_METRICS,
        })
        .cli(CliConfig {
            name: "linkedin",
            aliases: &["ln"],
        })
        .credentials(CREDENTIALS)
        .build_with(build)
        .build()
}

/// Access token from the resolved credentials, else from the client's
/// entry in the credentials file.
fn access_token(config: &ConnectorsConfig, credentials: &Credentials) -> Result<String, FetchError> {
    if let Some(token) = credentials.get("access_token") {
        return Ok(token.to_string());
    }
    match (&config.linkedin.cred, &config.linkedin.client_name) {
        (Some(path), Some(client)) => Ok(ClientCredentials::load(path, client)?.access_token),
        (Some(_), None) => Err(FetchError::Config(
            "LinkedIn credentials file given without a client name (-c/--client-name)".into(),
        )),
        _ => credentials.require("access_token").map(ToString::to_string),
    }
}

fn build(
    config: &ConnectorsConfig,
    credentials: &Credentials,
    ctx: &FetchContext,
) -> Result<Box<dyn ReportSource>, FetchError> {
    let token = access_token(config, credentials)?;
    let client = LinkedInClient::new(restricted_http(&ctx.http, ALLOWED_DOMAINS), token);
    Ok(Box::new(
        LinkedInSource::new(client)
            .with_query_type(config.linkedin.query_type)
            .with_request_interval(Duration::from_millis(config.linkedin.request_interval_ms)),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_from_credentials_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ln_cred.json");
        std::fs::write(&path, r#"{"acme": {"id": 1, "access_token": "from-file"}}"#).unwrap();

        let mut config = ConnectorsConfig::default();
        config.linkedin.cred = Some(path);
        config.linkedin.client_name = Some("acme".into());

        let empty = Credentials::new(Platform::LinkedIn);
        assert_eq!(access_token(&config, &empty).unwrap(), "from-file");

        let flagged = Credentials::new(Platform::LinkedIn).with("access_token", "from-flag");
        assert_eq!(access_token(&config, &flagged).unwrap(), "from-flag");

        config.linkedin.client_name = None;
        assert!(matches!(access_token(&config, &empty), Err(FetchError::Config(_))));
    }

    #[test]
    fn test_missing_token() {
        let err = access_token(&ConnectorsConfig::default(), &Credentials::new(Platform::LinkedIn)).unwrap_err();
        assert!(matches!(err, FetchError::MissingCredential(_)));
    }
}
