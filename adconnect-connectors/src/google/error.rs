//! Google API error envelope.

use adconnect_fetch::FetchError;
use serde::Deserialize;
use thiserror::Error;

/// The `error` object Google APIs return on failure.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Error)]
#[error("Google API error {code} ({status}): {message}")]
pub struct GoogleApiError {
    /// HTTP status echoed in the body.
    pub code: u16,
    /// Human-readable message.
    #[serde(default)]
    pub message: String,
    /// Canonical status such as `PERMISSION_DENIED`.
    #[serde(default)]
    pub status: String,
}

#[derive(Deserialize)]
struct Envelope {
    error: GoogleApiError,
}

impl GoogleApiError {
    /// Parses `{"error": {...}}`, or the first element of a streamed array of
    /// them.
    pub fn parse(body: &str) -> Option<Self> {
        if let Ok(envelope) = serde_json::from_str::<Envelope>(body) {
            return Some(envelope.error);
        }
        serde_json::from_str::<Vec<Envelope>>(body)
            .ok()?
            .into_iter()
            .next()
            .map(|e| e.error)
    }

    /// Replaces an opaque [`FetchError::Api`] with the decoded error.
    pub fn map(err: FetchError) -> FetchError {
        match err {
            FetchError::Api { status, body } => match Self::parse(&body) {
                Some(api) => api.into(),
                None => FetchError::Api { status, body },
            },
            other => other,
        }
    }
}

impl From<GoogleApiError> for FetchError {
    fn from(err: GoogleApiError) -> Self {
        match (err.code, err.status.as_str()) {
            (401 | 403, _) | (_, "UNAUTHENTICATED" | "PERMISSION_DENIED") => {
                FetchError::AuthenticationFailed(err.to_string())
            }
            (429, _) | (_, "RESOURCE_EXHAUSTED") => FetchError::RateLimited { retry_after: None },
            (code, _) => FetchError::Api {
                status: code,
                body: err.message,
            },
        }
    }
}
