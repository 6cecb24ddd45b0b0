//! Installed-app OAuth for Google APIs.
//!
//! ## Flow
//!
//! 1. **Consent**: [`GoogleAuth::authorization_url`] is opened in a browser
//! 2. **Exchange**: the pasted code goes to [`GoogleAuth::exchange_code`],
//!    which stores the refresh token in the token cache
//! 3. **Use**: [`GoogleAuth::access_token`] refreshes on demand and keeps the
//!    cache current

use std::path::Path;

use adconnect_fetch::{CachedToken, FetchError, HttpClient, TokenCache};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};
use url::Url;

// ============================================================================
// Constants
// ============================================================================

/// Google OAuth2 token endpoint.
pub const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

/// Google OAuth2 consent page.
const AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/auth";

/// Userinfo endpoint used to describe connections.
pub const USERINFO_ENDPOINT: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

/// Redirect used when the secrets file lists none.
const LOOPBACK_REDIRECT: &str = "http://localhost";

/// Tokens expiring within this window are refreshed early.
const EXPIRY_SKEW_SECS: i64 = 60;

// ============================================================================
// Client Secrets
// ============================================================================

/// OAuth client from a Cloud console secrets file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientSecrets {
    /// OAuth client id.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
    /// Consent page.
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    /// Token endpoint.
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    /// Registered redirect URIs.
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

fn default_auth_uri() -> String {
    AUTH_ENDPOINT.to_string()
}

fn default_token_uri() -> String {
    TOKEN_ENDPOINT.to_string()
}

#[derive(Deserialize)]
struct SecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

impl ClientSecrets {
    /// An installed-app client with Google's default endpoints.
    pub fn installed(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            auth_uri: default_auth_uri(),
            token_uri: default_token_uri(),
            redirect_uris: Vec::new(),
        }
    }

    /// Parses a secrets file with an `installed` or `web` section.
    pub fn from_json(json: &str) -> Result<Self, FetchError> {
        let file: SecretsFile = serde_json::from_str(json)
            .map_err(|e| FetchError::Config(format!("invalid client secrets: {e}")))?;
        file.installed
            .or(file.web)
            .ok_or_else(|| FetchError::Config("client secrets have no `installed` or `web` section".into()))
    }

    /// Reads a secrets file.
    pub fn load(path: &Path) -> Result<Self, FetchError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            FetchError::Config(format!("cannot read client secrets {}: {e}", path.display()))
        })?;
        Self::from_json(&content)
    }

    /// Redirect URI sent with the consent request and the code exchange.
    pub fn redirect_uri(&self) -> &str {
        self.redirect_uris
            .first()
            .map_or(LOOPBACK_REDIRECT, String::as_str)
    }
}

// ============================================================================
// Responses
// ============================================================================

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// The authenticated Google user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    /// Google account id.
    #[serde(default)]
    pub id: String,
    /// Account email.
    #[serde(default)]
    pub email: String,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
}

// ============================================================================
// Google Auth
// ============================================================================

/// Access-token provider for one Google platform.
///
/// Shared between concurrent account fetches; refreshes are serialized.
#[derive(Debug)]
pub struct GoogleAuth {
    secrets: ClientSecrets,
    cache: TokenCache,
    http: HttpClient,
    scopes: Vec<String>,
    userinfo_url: String,
    token: Mutex<Option<CachedToken>>,
}

impl GoogleAuth {
    /// Creates a provider.
    pub fn new(secrets: ClientSecrets, cache: TokenCache, http: HttpClient, scopes: &[&str]) -> Self {
        Self {
            secrets,
            cache,
            http,
            scopes: scopes.iter().map(ToString::to_string).collect(),
            userinfo_url: USERINFO_ENDPOINT.to_string(),
            token: Mutex::new(None),
        }
    }

    /// Overrides the userinfo endpoint.
    #[must_use]
    pub fn with_userinfo_url(mut self, url: impl Into<String>) -> Self {
        self.userinfo_url = url.into();
        self
    }

    /// Starts from a known refresh token instead of the cache file.
    #[must_use]
    pub fn with_refresh_token(self, refresh_token: impl Into<String>) -> Self {
        let token = CachedToken {
            refresh_token: Some(refresh_token.into()),
            ..CachedToken::default()
        };
        Self {
            token: Mutex::new(Some(token)),
            ..self
        }
    }

    /// Requested scopes.
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    /// The token cache backing this provider.
    pub fn cache(&self) -> &TokenCache {
        &self.cache
    }

    /// Consent page URL requesting offline access.
    pub fn authorization_url(&self) -> Result<String, FetchError> {
        let scope = self.scopes.join(" ");
        let url = Url::parse_with_params(
            &self.secrets.auth_uri,
            &[
                ("client_id", self.secrets.client_id.as_str()),
                ("redirect_uri", self.secrets.redirect_uri()),
                ("response_type", "code"),
                ("scope", scope.as_str()),
                ("access_type", "offline"),
                ("prompt", "consent"),
            ],
        )
        .map_err(|e| FetchError::Config(format!("invalid auth uri: {e}")))?;
        Ok(url.into())
    }

    /// Exchanges a consent code for tokens and stores them.
    #[instrument(skip_all)]
    pub async fn exchange_code(&self, code: &str) -> Result<CachedToken, FetchError> {
        let form = [
            ("grant_type", "authorization_code"),
            ("code", code.trim()),
            ("client_id", self.secrets.client_id.as_str()),
            ("client_secret", self.secrets.client_secret.as_str()),
            ("redirect_uri", self.secrets.redirect_uri()),
        ];
        let response: TokenResponse = self
            .http
            .post_form(&self.secrets.token_uri, &form)
            .await
            .map_err(rejected)?;

        let token = CachedToken {
            access_token: Some(response.access_token),
            refresh_token: response.refresh_token,
            expires_at: response.expires_in.map(|s| Utc::now() + Duration::seconds(s)),
        };
        if token.refresh_token.is_none() {
            return Err(FetchError::AuthenticationFailed(
                "consent did not return a refresh token".into(),
            ));
        }

        self.cache.save(&token).await?;
        *self.token.lock().await = Some(token.clone());
        info!(path = %self.cache.path().display(), "Stored Google credentials");
        Ok(token)
    }

    /// Returns a valid access token, refreshing it when needed.
    pub async fn access_token(&self) -> Result<String, FetchError> {
        let skew = Duration::seconds(EXPIRY_SKEW_SECS);
        let mut guard = self.token.lock().await;

        if guard.is_none() {
            *guard = self.cache.load().await?;
        }
        if let Some(token) = guard.as_ref().and_then(|t| t.valid_access_token(skew)) {
            return Ok(token.to_string());
        }

        let refresh_token = guard
            .as_ref()
            .and_then(|t| t.refresh_token.clone())
            .ok_or_else(|| {
                FetchError::AuthenticationFailed(format!(
                    "no Google refresh token in {}; run `adconnect auth google` first",
                    self.cache.path().display()
                ))
            })?;

        let token = self.refresh(&refresh_token).await?;
        let access = token.access_token.clone().unwrap_or_default();
        self.cache.save(&token).await?;
        *guard = Some(token);
        Ok(access)
    }

    #[instrument(skip_all)]
    async fn refresh(&self, refresh_token: &str) -> Result<CachedToken, FetchError> {
        debug!("Refreshing Google access token");
        let form = [
            ("grant_type", "refresh_token"),
            ("client_id", self.secrets.client_id.as_str()),
            ("client_secret", self.secrets.client_secret.as_str()),
            ("refresh_token", refresh_token),
        ];
        let response: TokenResponse = self
            .http
            .post_form(&self.secrets.token_uri, &form)
            .await
            .map_err(rejected)?;

        Ok(CachedToken {
            access_token: Some(response.access_token),
            refresh_token: response
                .refresh_token
                .or_else(|| Some(refresh_token.to_string())),
            expires_at: response.expires_in.map(|s| Utc::now() + Duration::seconds(s)),
        })
    }

    /// Fetches the authenticated user.
    pub async fn user_info(&self) -> Result<UserInfo, FetchError> {
        let token = self.access_token().await?;
        self.http
            .json(self.http.get(&self.userinfo_url).bearer_auth(token))
            .await
    }
}

/// Token endpoint refusals (`invalid_grant` and friends) are auth failures.
fn rejected(err: FetchError) -> FetchError {
    match err {
        FetchError::Api { status, body } if status < 500 => {
            FetchError::AuthenticationFailed(format!("token request rejected ({status}): {body}"))
        }
        other => other,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn secrets(token_uri: &str) -> ClientSecrets {
        ClientSecrets::from_json(&format!(
            r#"{{"installed": {{
                "client_id": "123.apps.googleusercontent.com",
                "client_secret": "shh",
                "token_uri": "{token_uri}",
                "redirect_uris": ["http://localhost"]
            }}}}"#
        ))
        .unwrap()
    }

    #[test]
    fn test_secrets_sections() {
        let web = ClientSecrets::from_json(r#"{"web": {"client_id": "a", "client_secret": "b"}}"#).unwrap();
        assert_eq!(web.token_uri, TOKEN_ENDPOINT);
        assert_eq!(web.redirect_uri(), "http://localhost");

        let err = ClientSecrets::from_json(r#"{"other": {}}"#).unwrap_err();
        assert!(matches!(err, FetchError::Config(_)));
    }

    #[test]
    fn test_authorization_url() {
        let dir = TempDir::new().unwrap();
        let auth = GoogleAuth::new(
            secrets(TOKEN_ENDPOINT),
            TokenCache::new(dir.path().join("t.json")),
            HttpClient::new(),
            &["https://www.googleapis.com/auth/dfareporting", "https://www.googleapis.com/auth/userinfo.email"],
        );
        let url = Url::parse(&auth.authorization_url().unwrap()).unwrap();
        let params: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();

        assert_eq!(url.host_str(), Some("accounts.google.com"));
        assert_eq!(params["access_type"], "offline");
        assert_eq!(params["client_id"], "123.apps.googleusercontent.com");
        assert_eq!(
            params["scope"],
            "https://www.googleapis.com/auth/dfareporting https://www.googleapis.com/auth/userinfo.email"
        );
    }

    #[tokio::test]
    async fn test_refreshes_and_caches() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "ya29.fresh",
                "expires_in": 3599,
                "token_type": "Bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let cache = TokenCache::new(dir.path().join("dv360-token.json"));
        cache
            .save(&CachedToken {
                access_token: Some("ya29.stale".into()),
                refresh_token: Some("1//refresh".into()),
                expires_at: Some(Utc::now() - Duration::minutes(5)),
            })
            .await
            .unwrap();

        let auth = GoogleAuth::new(
            secrets(&format!("{}/token", server.uri())),
            cache.clone(),
            HttpClient::new(),
            &[],
        );

        assert_eq!(auth.access_token().await.unwrap(), "ya29.fresh");
        // Second call is served from memory.
        assert_eq!(auth.access_token().await.unwrap(), "ya29.fresh");

        let stored = cache.load().await.unwrap().unwrap();
        assert_eq!(stored.access_token.as_deref(), Some("ya29.fresh"));
        assert_eq!(stored.refresh_token.as_deref(), Some("1//refresh"));
    }

    #[tokio::test]
    async fn test_invalid_grant_is_auth_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_string(r#"{"error": "invalid_grant", "error_description": "Token has been expired or revoked."}"#),
            )
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let cache = TokenCache::new(dir.path().join("gcm-token.json"));
        cache
            .save(&CachedToken {
                refresh_token: Some("1//revoked".into()),
                ..CachedToken::default()
            })
            .await
            .unwrap();

        let auth = GoogleAuth::new(secrets(&format!("{}/token", server.uri())), cache, HttpClient::new(), &[]);
        let err = auth.access_token().await.unwrap_err();
        assert!(matches!(err, FetchError::AuthenticationFailed(_)));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_missing_refresh_token() {
        let dir = TempDir::new().unwrap();
        let auth = GoogleAuth::new(
            secrets(TOKEN_ENDPOINT),
            TokenCache::new(dir.path().join("none.json")),
            HttpClient::new(),
            &[],
        );
        let err = auth.access_token().await.unwrap_err();
        assert!(err.to_string().contains("adconnect auth google"));
    }

    #[tokio::test]
    async fn test_exchange_code_stores_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("code=4%2F0Adeu"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "ya29.new",
                "refresh_token": "1//new",
                "expires_in": 3599
            })))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let cache = TokenCache::new(dir.path().join("ga-token.json"));
        let auth = GoogleAuth::new(
            secrets(&format!("{}/token", server.uri())),
            cache.clone(),
            HttpClient::new(),
            &[],
        );

        auth.exchange_code("4/0Adeu\n").await.unwrap();
        let stored = cache.load().await.unwrap().unwrap();
        assert_eq!(stored.refresh_token.as_deref(), Some("1//new"));
        assert_eq!(auth.access_token().await.unwrap(), "ya29.new");
    }
}
