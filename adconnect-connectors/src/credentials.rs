//! Credential resolution.
//!
//! Each connector names the credentials it needs as [`CredentialSpec`]s.
//! Values are looked up in priority order:
//!
//! 1. CLI flag
//! 2. Environment variable
//! 3. System keychain (`adconnect:<cli name>` / key)
//! 4. Settings file

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use adconnect_core::Platform;
use adconnect_fetch::{FetchError, KeychainApi};
use tracing::{debug, warn};

use crate::config::ConnectorsConfig;

/// A credential a connector needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialSpec {
    /// Key used for flags, keychain accounts, and settings fields.
    pub key: &'static str,
    /// Environment variable consulted after the flag.
    pub env: &'static str,
    /// Whether the value must be hidden in output.
    pub secret: bool,
}

impl CredentialSpec {
    /// A secret credential.
    pub const fn secret(key: &'static str, env: &'static str) -> Self {
        Self {
            key,
            env,
            secret: true,
        }
    }

    /// A non-secret credential such as a username.
    pub const fn plain(key: &'static str, env: &'static str) -> Self {
        Self {
            key,
            env,
            secret: false,
        }
    }
}

/// Where a credential value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CredentialSource {
    /// Command-line flag.
    Flag,
    /// Environment variable.
    Env,
    /// System keychain.
    Keychain,
    /// Settings file.
    Settings,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Flag => "flag",
            Self::Env => "environment",
            Self::Keychain => "keychain",
            Self::Settings => "settings",
        })
    }
}

// ============================================================================
// Credentials
// ============================================================================

/// Resolved credentials for one platform.
#[derive(Clone, Default)]
pub struct Credentials {
    platform: Option<Platform>,
    values: HashMap<String, (String, CredentialSource)>,
}

impl Credentials {
    /// Creates an empty set.
    pub fn new(platform: Platform) -> Self {
        Self {
            platform: Some(platform),
            values: HashMap::new(),
        }
    }

    /// Adds a value as if given on the command line.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.insert(key, value.into(), CredentialSource::Flag);
        self
    }

    fn insert(&mut self, key: &str, value: String, source: CredentialSource) {
        self.values.insert(key.to_string(), (value, source));
    }

    /// Returns a value if resolved.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|(v, _)| v.as_str())
    }

    /// Returns where a value came from.
    pub fn source(&self, key: &str) -> Option<CredentialSource> {
        self.values.get(key).map(|(_, s)| *s)
    }

    /// Returns a value or a [`FetchError::MissingCredential`].
    pub fn require(&self, key: &str) -> Result<&str, FetchError> {
        self.get(key).ok_or_else(|| {
            let platform = self.platform.map_or("connector", |p| p.cli_name());
            FetchError::MissingCredential(format!(
                "{platform} needs `{key}`; pass --{}, set the environment variable, or store it in the keychain",
                key.replace('_', "-")
            ))
        })
    }

    /// Number of resolved values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if nothing was resolved.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Values never reach logs.
        let mut keys: Vec<_> = self.values.iter().map(|(k, (_, s))| (k, s)).collect();
        keys.sort();
        f.debug_struct("Credentials")
            .field("platform", &self.platform)
            .field("keys", &keys)
            .finish()
    }
}

// ============================================================================
// Resolver
// ============================================================================

type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Resolves [`CredentialSpec`]s against flags, environment, keychain, and
/// settings.
#[derive(Clone)]
pub struct CredentialResolver {
    keychain: Arc<dyn KeychainApi>,
    env: EnvLookup,
}

impl CredentialResolver {
    /// Creates a resolver reading the process environment.
    pub fn new(keychain: Arc<dyn KeychainApi>) -> Self {
        Self {
            keychain,
            env: Arc::new(|name| std::env::var(name).ok()),
        }
    }

    /// Replaces the environment lookup.
    #[must_use]
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env = Arc::new(lookup);
        self
    }

    /// Resolves every spec. Missing values are left out; connectors call
    /// [`Credentials::require`] for the ones they need.
    pub async fn resolve(
        &self,
        platform: Platform,
        specs: &[CredentialSpec],
        flags: &HashMap<String, String>,
        config: &ConnectorsConfig,
    ) -> Credentials {
        let mut credentials = Credentials::new(platform);

        for spec in specs {
            if let Some((value, source)) = self.lookup(platform, spec, flags, config).await {
                debug!(platform = %platform, key = spec.key, source = %source, "Resolved credential");
                credentials.insert(spec.key, value, source);
            }
        }

        credentials
    }

    async fn lookup(
        &self,
        platform: Platform,
        spec: &CredentialSpec,
        flags: &HashMap<String, String>,
        config: &ConnectorsConfig,
    ) -> Option<(String, CredentialSource)> {
        if let Some(value) = flags.get(spec.key).filter(|v| !v.is_empty()) {
            return Some((value.clone(), CredentialSource::Flag));
        }

        if let Some(value) = (self.env)(spec.env).filter(|v| !v.is_empty()) {
            return Some((value, CredentialSource::Env));
        }

        match self.keychain.get(platform.cli_name(), spec.key).await {
            Ok(Some(value)) => return Some((value, CredentialSource::Keychain)),
            Ok(None) => {}
            Err(e) => {
                warn!(platform = %platform, key = spec.key, error = %e, "Keychain lookup failed");
            }
        }

        config
            .stored_credential(platform, spec.key)
            .map(|v| (v, CredentialSource::Settings))
    }
}

impl fmt::Debug for CredentialResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialResolver").finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use adconnect_fetch::MemoryKeychain;

    const SPECS: &[CredentialSpec] = &[
        CredentialSpec::plain("username", "TTD_USERNAME"),
        CredentialSpec::secret("password", "TTD_PASSWORD"),
    ];

    fn resolver(keychain: Arc<MemoryKeychain>, env: &'static [(&'static str, &'static str)]) -> CredentialResolver {
        CredentialResolver::new(keychain).with_env(move |name| {
            env.iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| (*v).to_string())
        })
    }

    #[tokio::test]
    async fn test_priority_order() {
        let keychain = Arc::new(MemoryKeychain::new());
        keychain.set("ttd", "username", "from-keychain").await.unwrap();
        keychain.set("ttd", "password", "secret-keychain").await.unwrap();

        let mut config = ConnectorsConfig::default();
        config.tradedesk.username = Some("from-settings".into());

        let flags = HashMap::from([("username".to_string(), "from-flag".to_string())]);
        let creds = resolver(keychain.clone(), &[("TTD_USERNAME", "from-env")])
            .resolve(Platform::TradeDesk, SPECS, &flags, &config)
            .await;
        assert_eq!(creds.get("username"), Some("from-flag"));
        assert_eq!(creds.get("password"), Some("secret-keychain"));
        assert_eq!(creds.source("password"), Some(CredentialSource::Keychain));

        let creds = resolver(keychain.clone(), &[("TTD_USERNAME", "from-env")])
            .resolve(Platform::TradeDesk, SPECS, &HashMap::new(), &config)
            .await;
        assert_eq!(creds.get("username"), Some("from-env"));

        keychain.delete("ttd", "username").await.unwrap();
        let creds = resolver(keychain, &[])
            .resolve(Platform::TradeDesk, SPECS, &HashMap::new(), &config)
            .await;
        assert_eq!(creds.get("username"), Some("from-settings"));
        assert_eq!(creds.source("username"), Some(CredentialSource::Settings));
    }

    #[tokio::test]
    async fn test_missing_credential() {
        let creds = resolver(Arc::new(MemoryKeychain::new()), &[])
            .resolve(Platform::TradeDesk, SPECS, &HashMap::new(), &ConnectorsConfig::default())
            .await;
        assert!(creds.is_empty());

        let err = creds.require("password").unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("--password"));
    }

    #[test]
    fn test_debug_hides_values() {
        let creds = Credentials::new(Platform::Facebook).with("access_token", "EAAB-very-secret");
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("access_token"));
        assert!(!rendered.contains("very-secret"));
    }
}
