//! Store error types.

use adconnect_core::CoreError;
use thiserror::Error;

/// Errors from settings persistence and report output.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The settings file exists but could not be used.
    #[error("Invalid settings file {path}: {reason}")]
    InvalidSettings {
        /// Path of the file.
        path: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A frame could not be encoded.
    #[error("Report encoding failed: {0}")]
    Report(#[from] CoreError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StoreError {
    /// Returns true if the error means the file was not there.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}
