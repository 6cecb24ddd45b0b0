//! Google Analytics settings.

use serde::{Deserialize, Serialize};

use crate::google::GoogleOAuthConfig;

/// Google Analytics connector settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleAnalyticsConfig {
    /// OAuth client and token cache.
    #[serde(flatten)]
    pub oauth: GoogleOAuthConfig,
    /// Views to report on; empty means every view the user can read.
    pub view_ids: Vec<String>,
}
