//! Connector descriptor system.
//!
//! A descriptor contains all the static configuration for a platform:
//! - Metadata (display name, API base, allowed domains)
//! - Default report dimensions
//! - CLI names
//! - Credentials it needs
//! - How to build the connector

use adconnect_core::Platform;
use adconnect_fetch::{FetchContext, FetchError, HttpClient, ReportSource};

use crate::config::ConnectorsConfig;
use crate::credentials::{CredentialSpec, Credentials};

/// Builds a connector from configuration and resolved credentials.
pub type BuildFn =
    fn(&ConnectorsConfig, &Credentials, &FetchContext) -> Result<Box<dyn ReportSource>, FetchError>;

// ============================================================================
// Connector Descriptor
// ============================================================================

/// Complete descriptor for a platform connector.
pub struct ConnectorDescriptor {
    /// Platform identifier.
    pub id: Platform,
    /// Display metadata.
    pub metadata: ConnectorMetadata,
    /// CLI naming.
    pub cli: CliConfig,
    /// Credentials resolved before the connector is built.
    pub credentials: &'static [CredentialSpec],
    /// Google OAuth scopes; empty for platforms that do not use Google OAuth.
    pub oauth_scopes: &'static [&'static str],
    /// Connector constructor.
    pub build: BuildFn,
}

impl ConnectorDescriptor {
    /// Creates a new descriptor builder.
    pub fn builder(id: Platform) -> ConnectorDescriptorBuilder {
        ConnectorDescriptorBuilder::new(id)
    }

    /// Returns the display name.
    pub fn display_name(&self) -> &str {
        self.metadata.display_name
    }

    /// Returns the CLI name.
    pub fn cli_name(&self) -> &str {
        self.cli.name
    }

    /// Dimensions requested when the caller gives none.
    pub fn default_dimensions(&self) -> Vec<String> {
        self.metadata
            .default_dimensions
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    /// HTTP client restricted to this platform's domains.
    pub fn http_client(&self, base: &HttpClient) -> HttpClient {
        restricted_http(base, self.metadata.allowed_domains)
    }

    /// Builds the connector.
    pub fn connect(
        &self,
        config: &ConnectorsConfig,
        credentials: &Credentials,
        ctx: &FetchContext,
    ) -> Result<Box<dyn ReportSource>, FetchError> {
        (self.build)(config, credentials, ctx)
    }
}

/// Copy of `base` that may only contact `domains` (no restriction if empty).
pub fn restricted_http(base: &HttpClient, domains: &[&str]) -> HttpClient {
    let client = base.clone();
    if domains.is_empty() {
        return client;
    }
    client.with_allowed_domains(domains.iter().map(ToString::to_string).collect())
}

// ============================================================================
// Metadata
// ============================================================================

/// Static display metadata for a connector.
#[derive(Debug, Clone, Copy)]
pub struct ConnectorMetadata {
    /// Human-readable name.
    pub display_name: &'static str,
    /// One-line description.
    pub description: &'static str,
    /// API base URL.
    pub api_url: &'static str,
    /// Vendor reference documentation.
    pub docs_url: &'static str,
    /// Domains the connector may contact.
    pub allowed_domains: &'static [&'static str],
    /// Report dimensions used when none are given.
    pub default_dimensions: &'static [&'static str],
}

impl ConnectorMetadata {
    /// Metadata with only the display name taken from the platform.
    pub fn for_platform(platform: Platform) -> Self {
        Self {
            display_name: platform.display_name(),
            description: "",
            api_url: "",
            docs_url: "",
            allowed_domains: &[],
            default_dimensions: &[],
        }
    }
}

// ============================================================================
// CLI Config
// ============================================================================

/// CLI naming for a connector.
#[derive(Debug, Clone, Copy, Default)]
pub struct CliConfig {
    /// Primary subcommand name.
    pub name: &'static str,
    /// Alternative names.
    pub aliases: &'static [&'static str],
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`ConnectorDescriptor`].
pub struct ConnectorDescriptorBuilder {
    id: Platform,
    metadata: Option<ConnectorMetadata>,
    cli: Option<CliConfig>,
    credentials: &'static [CredentialSpec],
    oauth_scopes: &'static [&'static str],
    build: BuildFn,
}

impl ConnectorDescriptorBuilder {
    /// Creates a new builder for the given platform.
    pub fn new(id: Platform) -> Self {
        Self {
            id,
            metadata: None,
            cli: None,
            credentials: &[],
            oauth_scopes: &[],
            build: |_, _, _| Err(FetchError::Config("connector is not buildable".into())),
        }
    }

    /// Sets the metadata.
    #[must_use]
    pub fn metadata(mut self, metadata: ConnectorMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Sets the CLI configuration.
    #[must_use]
    pub fn cli(mut self, cli: CliConfig) -> Self {
        self.cli = Some(cli);
        self
    }

    /// Sets the credentials to resolve.
    #[must_use]
    pub fn credentials(mut self, specs: &'static [CredentialSpec]) -> Self {
        self.credentials = specs;
        self
    }

    /// Sets the Google OAuth scopes.
    #[must_use]
    pub fn oauth_scopes(mut self, scopes: &'static [&'static str]) -> Self {
        self.oauth_scopes = scopes;
        self
    }

    /// Sets the connector constructor.
    #[must_use]
    pub fn build_with(mut self, build: BuildFn) -> Self {
        self.build = build;
        self
    }

    /// Builds the descriptor.
    pub fn build(self) -> ConnectorDescriptor {
        ConnectorDescriptor {
            id: self.id,
            metadata: self
                .metadata
                .unwrap_or_else(|| ConnectorMetadata::for_platform(self.id)),
            cli: self.cli.unwrap_or(CliConfig {
                name: self.id.cli_name(),
                aliases: &[],
            }),
            credentials: self.credentials,
            oauth_scopes: self.oauth_scopes,
            build: self.build,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let desc = ConnectorDescriptor::builder(Platform::GoogleTrends).build();
        assert_eq!(desc.display_name(), "Google Trends");
        assert_eq!(desc.cli_name(), "gt");
        assert!(desc.default_dimensions().is_empty());

        let err = desc
            .connect(
                &ConnectorsConfig::default(),
                &Credentials::new(Platform::GoogleTrends),
                &FetchContext::builder()
                    .keychain(std::sync::Arc::new(adconnect_fetch::MemoryKeychain::new()))
                    .build(),
            )
            .err()
            .unwrap();
        assert!(matches!(err, FetchError::Config(_)));
    }
}
