//! Shared Google OAuth and API plumbing.
//!
//! DV360, Campaign Manager, Google Ads, and Google Analytics authenticate
//! with an installed-app OAuth client. The client secrets file is the one
//! downloaded from the Cloud console; the refresh token lives in the token
//! cache and is obtained once with `adconnect auth google`.

mod auth;
mod client;
mod error;

use std::path::PathBuf;
use std::sync::Arc;

use adconnect_core::Platform;
use adconnect_fetch::{FetchContext, FetchError, TokenCache};
use serde::{Deserialize, Serialize};

use crate::config::ConnectorsConfig;
use crate::descriptor::restricted_http;
use crate::registry::ConnectorRegistry;

pub use auth::{ClientSecrets, GoogleAuth, UserInfo, TOKEN_ENDPOINT, USERINFO_ENDPOINT};
pub use client::GoogleClient;
pub use error::GoogleApiError;

/// Where a Google connector finds its OAuth client and cached token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleOAuthConfig {
    /// Path to the OAuth client secrets JSON.
    pub client_secrets: Option<PathBuf>,
    /// Token cache file. Defaults to `<cache>/adconnect/<platform>-token.json`.
    pub token_cache: Option<PathBuf>,
}

/// Domains the Google connectors may contact.
pub const GOOGLE_DOMAINS: &[&str] = &["googleapis.com", "accounts.google.com"];

impl GoogleOAuthConfig {
    /// Builds an authorized client for `platform` with the given scopes.
    ///
    /// Requests go through the context's retrying client, limited to
    /// `domains`.
    pub fn connect(
        &self,
        platform: Platform,
        scopes: &[&str],
        domains: &[&str],
        ctx: &FetchContext,
    ) -> Result<GoogleClient, FetchError> {
        let secrets_path = self.client_secrets.as_deref().ok_or_else(|| {
            FetchError::Config(format!(
                "{} needs an OAuth client; set connectors.{}.client_secrets",
                platform.display_name(),
                settings_key(platform)
            ))
        })?;
        let secrets = ClientSecrets::load(secrets_path)?;
        Ok(self.connect_with(platform, secrets, None, scopes, domains, ctx))
    }

    /// Like [`connect`](Self::connect) with an OAuth client supplied by the
    /// caller, optionally seeding the refresh token.
    pub fn connect_with(
        &self,
        platform: Platform,
        secrets: ClientSecrets,
        refresh_token: Option<String>,
        scopes: &[&str],
        domains: &[&str],
        ctx: &FetchContext,
    ) -> GoogleClient {
        let cache = TokenCache::new(
            self.token_cache
                .clone()
                .unwrap_or_else(|| ctx.settings.token_cache_path(platform.cli_name())),
        );

        let http = restricted_http(&ctx.retrying_http(), domains);
        let mut auth = GoogleAuth::new(secrets, cache, http.clone(), scopes);
        if let Some(token) = refresh_token {
            auth = auth.with_refresh_token(token);
        }
        GoogleClient::new(http, Arc::new(auth))
    }
}

fn settings_key(platform: Platform) -> &'static str {
    match platform {
        Platform::Dv360 => "dv360",
        Platform::CampaignManager => "campaign_manager",
        Platform::GoogleAds => "google_ads",
        Platform::GoogleAnalytics => "google_analytics",
        _ => platform.cli_name(),
    }
}

/// Client for running the consent flow of a Google platform, with the
/// platform's OAuth settings and scopes.
pub fn consent_client(
    platform: Platform,
    config: &ConnectorsConfig,
    ctx: &FetchContext,
) -> Result<GoogleClient, FetchError> {
    let oauth = config.google_oauth(platform).ok_or_else(|| {
        FetchError::Config(format!("{} does not use Google OAuth", platform.display_name()))
    })?;
    let scopes = ConnectorRegistry::get(platform).map_or(&[][..], |d| d.oauth_scopes);
    oauth.connect(platform, scopes, GOOGLE_DOMAINS, ctx)
}


#[cfg(test)]
mod tests {
    use super::*;
    use adconnect_fetch::MemoryKeychain;

    fn ctx(dir: &std::path::Path) -> FetchContext {
        FetchContext::builder()
            .keychain(Arc::new(MemoryKeychain::new()))
            .cache_dir(dir)
            .build()
    }

    #[test]
    fn test_connect_requires_client_secrets() {
        let dir = tempfile::tempdir().unwrap();
        let err = GoogleOAuthConfig::default()
            .connect(Platform::Dv360, &[], GOOGLE_DOMAINS, &ctx(dir.path()))
            .unwrap_err();
        assert!(matches!(err, FetchError::Config(_)));
        assert!(err.to_string().contains("connectors.dv360.client_secrets"));
    }

    #[test]
    fn test_consent_client_uses_platform_scopes() {
        let dir = tempfile::tempdir().unwrap();
        let secrets = dir.path().join("client_secrets.json");
        std::fs::write(&secrets, r#"{"installed": {"client_id": "cid", "client_secret": "shh"}}"#).unwrap();

        let mut config = ConnectorsConfig::default();
        config.campaign_manager.oauth.client_secrets = Some(secrets);

        let client = consent_client(Platform::CampaignManager, &config, &ctx(dir.path())).unwrap();
        assert!(client.auth().scopes().iter().any(|s| s.ends_with("/dfareporting")));
        assert!(client.auth().cache().path().ends_with("gcm-token.json"));

        let err = consent_client(Platform::Facebook, &config, &ctx(dir.path())).unwrap_err();
        assert!(matches!(err, FetchError::Config(_)));
    }

    #[test]
    fn test_connect_uses_default_token_cache() {
        let dir = tempfile::tempdir().unwrap();
        let secrets = dir.path().join("client_secret.json");
        std::fs::write(
            &secrets,
            r#"{"installed": {"client_id": "cid.apps.googleusercontent.com", "client_secret": "shh"}}"#,
        )
        .unwrap();

        let config = GoogleOAuthConfig {
            client_secrets: Some(secrets),
            token_cache: None,
        };
        let client = config
            .connect(Platform::GoogleAnalytics, &["scope-a"], GOOGLE_DOMAINS, &ctx(dir.path()))
            .unwrap();
        assert_eq!(client.auth().scopes(), ["scope-a".to_string()]);
        assert_eq!(
            client.auth().cache().path(),
            dir.path().join(format!("{}-token.json", Platform::GoogleAnalytics.cli_name()))
        );
    }
}
