//! Google Ads settings and the `google-ads.yaml` file.

use std::fmt;
use std::path::{Path, PathBuf};

use adconnect_fetch::FetchError;
use serde::{Deserialize, Deserializer, Serialize};

use crate::google::GoogleOAuthConfig;

/// Google Ads connector settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleAdsConfig {
    /// OAuth client and token cache.
    #[serde(flatten)]
    pub oauth: GoogleOAuthConfig,
    /// API developer token.
    pub developer_token: Option<String>,
    /// Manager (MCC) account whose hierarchy is reported on.
    pub manager_account: Option<String>,
    /// A `google-ads.yaml` supplying any of the above.
    pub yaml: Option<PathBuf>,
}

/// The subset of `google-ads.yaml` this connector reads.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct GoogleAdsYaml {
    /// API developer token.
    pub developer_token: Option<String>,
    /// OAuth client id.
    pub client_id: Option<String>,
    /// OAuth client secret.
    pub client_secret: Option<String>,
    /// Long-lived refresh token.
    pub refresh_token: Option<String>,
    /// Manager account sent as `login-customer-id`.
    #[serde(deserialize_with = "optional_id")]
    pub login_customer_id: Option<String>,
}

impl fmt::Debug for GoogleAdsYaml {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleAdsYaml")
            .field("client_id", &self.client_id)
            .field("login_customer_id", &self.login_customer_id)
            .finish_non_exhaustive()
    }
}

/// Customer ids are often written as bare numbers.
fn optional_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<serde_yaml::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_yaml::Value::Number(n)) => Some(n.to_string()),
        Some(serde_yaml::Value::String(s)) => Some(s),
        _ => None,
    })
}

impl GoogleAdsYaml {
    /// Parses YAML text.
    pub fn from_yaml(text: &str) -> Result<Self, FetchError> {
        serde_yaml::from_str(text).map_err(|e| FetchError::Config(format!("invalid google-ads.yaml: {e}")))
    }

    /// Reads a YAML file.
    pub fn load(path: &Path) -> Result<Self, FetchError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| FetchError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_yaml(&text)
    }
}

/// Customer ids without dashes.
pub(crate) fn customer_id(raw: &str) -> String {
    raw.trim().replace('-', "")
}
