//! Twitter settings.

use serde::{Deserialize, Serialize};

/// Twitter Ads connector settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TwitterConfig {
    /// App consumer key.
    pub consumer_key: Option<String>,
    /// App consumer secret.
    pub consumer_secret: Option<String>,
    /// User access token.
    pub access_token: Option<String>,
    /// User access token secret.
    pub access_token_secret: Option<String>,
}
