//! Trade Desk error payloads.

use adconnect_fetch::FetchError;
use serde::Deserialize;
use thiserror::Error;

/// One entry of `ErrorDetails`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ErrorDetail {
    /// Offending property.
    #[serde(default)]
    pub property: Option<String>,
    /// Validation messages.
    #[serde(default)]
    pub reasons: Vec<String>,
}

/// Error body returned by the TTD API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Error)]
#[serde(rename_all = "PascalCase")]
#[error("Trade Desk error: {message}{}", render_details(.error_details))]
pub struct TradeDeskError {
    /// Summary message.
    #[serde(default)]
    pub message: String,
    /// Per-field validation failures.
    #[serde(default)]
    pub error_details: Vec<ErrorDetail>,
}

fn render_details(details: &[ErrorDetail]) -> String {
    let reasons: Vec<String> = details
        .iter()
        .map(|d| match &d.property {
            Some(property) => format!("{property}: {}", d.reasons.join("; ")),
            None => d.reasons.join("; "),
        })
        .collect();
    if reasons.is_empty() {
        String::new()
    } else {
        format!(" ({})", reasons.join(", "))
    }
}

impl TradeDeskError {
    /// Parses an error body.
    pub fn parse(body: &str) -> Option<Self> {
        serde_json::from_str::<Self>(body)
            .ok()
            .filter(|e| !e.message.is_empty())
    }

    /// Decodes TTD errors hidden in [`FetchError::Api`].
    pub fn map(err: FetchError) -> FetchError {
        match err {
            FetchError::Api { status, body } => match Self::parse(&body) {
                Some(ttd) => FetchError::Api {
                    status,
                    body: ttd.to_string(),
                },
                None => FetchError::Api { status, body },
            },
            other => other,
        }
    }
}
