//! Core error types for `AdConnect`.

use thiserror::Error;

/// Core error type for `AdConnect` operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Platform name did not match any supported platform.
    #[error("Unknown platform: {0}")]
    UnknownPlatform(String),

    /// Start date after end date, or an unparseable date.
    #[error("Invalid date range: {0}")]
    InvalidDateRange(String),

    /// Row or frame shape did not match.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// CSV encoding/decoding error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error while reading or writing a frame.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
