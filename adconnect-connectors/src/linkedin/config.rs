//! LinkedIn settings and the per-client credentials file.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use adconnect_fetch::FetchError;
use serde::{Deserialize, Serialize};

/// Pause between analytics requests, in milliseconds.
pub const DEFAULT_REQUEST_INTERVAL_MS: u64 = 2400;

/// Extra period column added to every row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    /// No period column.
    #[default]
    Day,
    /// Adds `week_number`.
    Week,
    /// Adds `month`.
    Month,
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        })
    }
}

impl FromStr for QueryType {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" | "daily" => Ok(Self::Day),
            "week" | "weekly" => Ok(Self::Week),
            "month" | "monthly" => Ok(Self::Month),
            other => Err(FetchError::Config(format!(
                "unknown LinkedIn query type `{other}` (expected day, week or month)"
            ))),
        }
    }
}

/// LinkedIn connector settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkedInConfig {
    /// Access token; takes precedence over the credentials file.
    pub access_token: Option<String>,
    /// Credentials JSON keyed by client name.
    pub cred: Option<PathBuf>,
    /// Entry of the credentials file to use.
    pub client_name: Option<String>,
    /// Period column added to rows.
    pub query_type: QueryType,
    /// Pause between analytics requests.
    pub request_interval_ms: u64,
}

impl Default for LinkedInConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            cred: None,
            client_name: None,
            query_type: QueryType::Day,
            request_interval_ms: DEFAULT_REQUEST_INTERVAL_MS,
        }
    }
}

/// One client entry of the credentials file.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClientCredentials {
    /// Organization id.
    pub id: Option<serde_json::Value>,
    /// Member access token.
    pub access_token: String,
    /// App client id.
    pub client_id: Option<String>,
    /// App client secret.
    pub client_secret: Option<String>,
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("id", &self.id)
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

impl ClientCredentials {
    /// Picks `client` out of a credentials document.
    pub fn from_json(json: &str, client: &str) -> Result<Self, FetchError> {
        let mut clients: HashMap<String, ClientCredentials> = serde_json::from_str(json)
            .map_err(|e| FetchError::Config(format!("invalid LinkedIn credentials file: {e}")))?;
        let entry = clients.remove(client).ok_or_else(|| {
            FetchError::MissingCredential(format!("LinkedIn credentials file has no client `{client}`"))
        })?;
        if entry.access_token.is_empty() {
            return Err(FetchError::MissingCredential(format!(
                "LinkedIn client `{client}` has no access_token"
            )));
        }
        Ok(entry)
    }

    /// Reads `client` from a credentials file.
    pub fn load(path: &Path, client: &str) -> Result<Self, FetchError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            FetchError::Config(format!("cannot read LinkedIn credentials {}: {e}", path.display()))
        })?;
        Self::from_json(&json, client)
    }
}
