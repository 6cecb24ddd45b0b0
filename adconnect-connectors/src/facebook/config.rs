//! Facebook settings.

use serde::{Deserialize, Serialize};

/// Graph API version used when none is configured.
pub const DEFAULT_API_VERSION: &str = "v17.0";

/// Facebook connector settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FacebookConfig {
    /// Long-lived user or system-user access token.
    pub access_token: Option<String>,
    /// Graph API version, e.g. `v17.0`.
    pub api_version: String,
}

impl Default for FacebookConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }
}
