//! Fetch context providing access to host APIs.
//!
//! The fetch context is handed to every connector when it is built and
//! gives unified access to the keychain, the shared HTTP client, and the
//! token cache location.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::host::{http::HttpClient, keychain::KeychainApi, keychain::SystemKeychain};
use crate::retry::RetryStrategy;

// ============================================================================
// Fetch Settings
// ============================================================================

/// Settings for fetch operations.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// Per-request timeout.
    pub timeout: Duration,
    /// Maximum attempts for transient failures on platforms that retry.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub retry_delay: Duration,
    /// Directory for cached OAuth tokens.
    pub cache_dir: PathBuf,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
            cache_dir: dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("adconnect"),
        }
    }
}

impl FetchSettings {
    /// Creates settings with custom timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Exponential retry strategy derived from these settings.
    pub fn retry_strategy(&self) -> RetryStrategy {
        RetryStrategy::new(self.max_retries).with_base_delay(self.retry_delay)
    }

    /// Default token cache file for a platform.
    pub fn token_cache_path(&self, name: &str) -> PathBuf {
        self.cache_dir.join(format!("{name}-token.json"))
    }
}

// ============================================================================
// Fetch Context
// ============================================================================

/// Context provided to connectors, giving access to host APIs.
#[derive(Clone)]
pub struct FetchContext {
    /// Secure credential storage.
    pub keychain: Arc<dyn KeychainApi>,
    /// Shared HTTP client.
    pub http: Arc<HttpClient>,
    /// Fetch settings.
    pub settings: FetchSettings,
}

impl FetchContext {
    /// Creates a new fetch context with default host API implementations.
    pub fn new() -> Self {
        Self::with_settings(FetchSettings::default())
    }

    /// Creates a context with custom settings.
    pub fn with_settings(settings: FetchSettings) -> Self {
        Self {
            keychain: Arc::new(SystemKeychain::new()),
            http: Arc::new(HttpClient::with_timeout(settings.timeout)),
            settings,
        }
    }

    /// Creates a builder for customizing the context.
    pub fn builder() -> FetchContextBuilder {
        FetchContextBuilder::new()
    }

    /// Returns the effective timeout for requests.
    pub fn timeout(&self) -> Duration {
        self.settings.timeout
    }

    /// A copy of the shared client that retries transient failures.
    pub fn retrying_http(&self) -> HttpClient {
        self.http
            .as_ref()
            .clone()
            .with_retry(self.settings.retry_strategy())
    }
}

impl Default for FetchContext {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FetchContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchContext")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Fetch Context Builder
// ============================================================================

/// Builder for constructing a `FetchContext`.
pub struct FetchContextBuilder {
    keychain: Option<Arc<dyn KeychainApi>>,
    http: Option<Arc<HttpClient>>,
    settings: FetchSettings,
}

impl FetchContextBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self {
            keychain: None,
            http: None,
            settings: FetchSettings::default(),
        }
    }

    /// Sets the keychain implementation.
    #[must_use]
    pub fn keychain(mut self, keychain: Arc<dyn KeychainApi>) -> Self {
        self.keychain = Some(keychain);
        self
    }

    /// Sets the HTTP client.
    #[must_use]
    pub fn http(mut self, http: Arc<HttpClient>) -> Self {
        self.http = Some(http);
        self
    }

    /// Sets the fetch settings.
    #[must_use]
    pub fn settings(mut self, settings: FetchSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Sets the timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.settings.timeout = timeout;
        self
    }

    /// Sets the token cache directory.
    #[must_use]
    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.settings.cache_dir = dir.into();
        self
    }

    /// Builds the fetch context.
    pub fn build(self) -> FetchContext {
        let timeout = self.settings.timeout;
        FetchContext {
            keychain: self.keychain.unwrap_or_else(|| Arc::new(SystemKeychain::new())),
            http: self
                .http
                .unwrap_or_else(|| Arc::new(HttpClient::with_timeout(timeout))),
            settings: self.settings,
        }
    }
}

impl Default for FetchContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
