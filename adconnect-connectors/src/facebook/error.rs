//! Graph API error payloads.

use adconnect_fetch::FetchError;
use serde::Deserialize;
use thiserror::Error;

/// Graph error code for an invalid or expired access token.
const INVALID_TOKEN: i64 = 190;

/// Graph error codes for application and account throttling.
const THROTTLED: &[i64] = &[4, 17, 32, 613, 80_004];

/// The `error` object of a failed Graph call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Error)]
#[error("Graph API error {code} ({kind}): {message}")]
pub struct GraphError {
    /// Human-readable message.
    #[serde(default)]
    pub message: String,
    /// Error class such as `OAuthException`.
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Numeric error code.
    #[serde(default)]
    pub code: i64,
    /// More specific code, when present.
    #[serde(default)]
    pub error_subcode: Option<i64>,
    /// Trace id for Facebook support.
    #[serde(default)]
    pub fbtrace_id: Option<String>,
}

#[derive(Deserialize)]
struct Envelope {
    error: GraphError,
}

impl GraphError {
    /// Parses `{"error": {...}}`.
    pub fn parse(body: &str) -> Option<Self> {
        serde_json::from_str::<Envelope>(body).ok().map(|e| e.error)
    }

    /// Returns true for throttling, which Graph also reports as
    /// `OAuthException` at the application level.
    pub fn is_throttled(&self) -> bool {
        THROTTLED.contains(&self.code)
    }

    /// Returns true if the token is invalid, expired, or lacks permission.
    pub fn is_auth(&self) -> bool {
        !self.is_throttled() && (self.code == INVALID_TOKEN || self.kind == "OAuthException")
    }

    /// Decodes Graph errors hidden in [`FetchError::Api`] and 401/403
    /// failures.
    pub fn map(err: FetchError) -> FetchError {
        match err {
            FetchError::Api { status, body } => match Self::parse(&body) {
                Some(graph) => graph.into(),
                None => FetchError::Api { status, body },
            },
            other => other,
        }
    }
}

impl From<GraphError> for FetchError {
    fn from(err: GraphError) -> Self {
        if err.is_throttled() {
            FetchError::RateLimited { retry_after: None }
        } else if err.is_auth() {
            FetchError::AuthenticationFailed(err.to_string())
        } else {
            FetchError::Api {
                status: 400,
                body: err.to_string(),
            }
        }
    }
}
