//! Google Ads connector descriptor.

use adconnect_core::Platform;
use adconnect_fetch::{FetchContext, FetchError, ReportSource};

use super::api::GoogleAdsClient;
use super::config::GoogleAdsYaml;
use super::fetcher::GoogleAdsSource;
use crate::config::ConnectorsConfig;
use crate::credentials::{CredentialSpec, Credentials};
use crate::descriptor::{CliConfig, ConnectorDescriptor, ConnectorMetadata};
use crate::google::{ClientSecrets, GOOGLE_DOMAINS, GoogleClient};

/// GAQL fields selected when none are given.
pub(crate) const DEFAULT_FIELDS: &[&str] = &[
    "customer.descriptive_name",
    "campaign.id",
    "campaign.name",
    "metrics.impressions",
    "metrics.clicks",
    "metrics.cost_micros",
    "segments.date",
    "customer.currency_code",
];

const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/adwords",
    "https://www.googleapis.com/auth/userinfo.email",
];

const CREDENTIALS: &[CredentialSpec] = &[CredentialSpec::secret("developer_token", "GOOGLE_ADS_DEVELOPER_TOKEN")];

/// Creates the Google Ads descriptor.
pub fn google_ads_descriptor() -> ConnectorDescriptor {
    ConnectorDescriptor::builder(Platform::GoogleAds)
        .metadata(ConnectorMetadata {
            display_name: "Google Ads",
            description: "Daily campaign metrics for every account under a manager",
            api_url: "https://googleads.googleapis.com/v17",
            docs_url: "https://developers.google.com/google-ads/api/rest/overview",
            allowed_domains: GOOGLE_DOMAINS,
            default_dimensions: DEFAULT_FIELDS,
        })
        .cli(CliConfig {
            name: "google-ads",
            aliases: &["ga"],
        })
        .credentials(CREDENTIALS)
        .oauth_scopes(SCOPES)
        .build_with(build)
        .build()
}

/// OAuth client from the settings, else from `google-ads.yaml`.
fn google_client(
    config: &ConnectorsConfig,
    yaml: &GoogleAdsYaml,
    ctx: &FetchContext,
) -> Result<GoogleClient, FetchError> {
    let oauth = &config.google_ads.oauth;
    match (&oauth.client_secrets, &yaml.client_id, &yaml.client_secret) {
        (None, Some(id), Some(secret)) => Ok(oauth.connect_with(
            Platform::GoogleAds,
            ClientSecrets::installed(id.as_str(), secret.as_str()),
            yaml.refresh_token.clone(),
            SCOPES,
            GOOGLE_DOMAINS,
            ctx,
        )),
        _ => oauth.connect(Platform::GoogleAds, SCOPES, GOOGLE_DOMAINS, ctx),
    }
}

fn build(
    config: &ConnectorsConfig,
    credentials: &Credentials,
    ctx: &FetchContext,
) -> Result<Box<dyn ReportSource>, FetchError> {
    let ads = &config.google_ads;
    let yaml = ads
        .yaml
        .as_deref()
        .map(GoogleAdsYaml::load)
        .transpose()?
        .unwrap_or_default();

    let developer_token = match credentials.get("developer_token").or(yaml.developer_token.as_deref()) {
        Some(token) => token.to_string(),
        None => credentials.require("developer_token")?.to_string(),
    };
    let manager = ads
        .manager_account
        .as_deref()
        .or(yaml.login_customer_id.as_deref());

    let client = GoogleAdsClient::new(google_client(config, &yaml, ctx)?, developer_token)
        .with_login_customer_id(manager);
    Ok(Box::new(GoogleAdsSource::new(client)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use adconnect_fetch::MemoryKeychain;
    use std::sync::Arc;

    fn ctx(dir: &std::path::Path) -> FetchContext {
        FetchContext::builder()
            .keychain(Arc::new(MemoryKeychain::new()))
            .cache_dir(dir)
            .build()
    }

    #[test]
    fn test_yaml_supplies_client_and_developer_token() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = dir.path().join("google-ads.yaml");
        std::fs::write(
            &yaml,
            "developer_token: dev\nclient_id: cid\nclient_secret: shh\nrefresh_token: 1//r\nlogin_customer_id: 1234567890\n",
        )
        .unwrap();

        let mut config = ConnectorsConfig::default();
        config.google_ads.yaml = Some(yaml);
        let source = build(&config, &Credentials::new(Platform::GoogleAds), &ctx(dir.path())).unwrap();
        assert_eq!(source.platform(), Platform::GoogleAds);
        assert_eq!(source.default_dimensions().len(), DEFAULT_FIELDS.len());
    }

    #[test]
    fn test_missing_developer_token() {
        let dir = tempfile::tempdir().unwrap();
        let err = build(
            &ConnectorsConfig::default(),
            &Credentials::new(Platform::GoogleAds),
            &ctx(dir.path()),
        )
        .err()
        .unwrap();
        assert!(matches!(err, FetchError::MissingCredential(_)));
    }
}
