// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `AdConnect` Core
//!
//! Core types and the report frame model shared by every `AdConnect` crate.
//!
//! This crate provides the foundational abstractions used across the
//! workspace:
//!
//! - Domain models (platforms, accounts, date ranges)
//! - The tabular [`ReportFrame`] and its CSV codec
//! - Column name normalization
//! - Error types
//!
//! ## Key Types
//!
//! ### Platform Types
//! - [`Platform`] - Enum of all supported advertising platforms
//! - [`AccountId`] - Opaque, platform-specific account identifier
//! - [`SubAccount`] - An account reachable from the login
//! - [`ConnectionInfo`] - Who we are logged in as
//!
//! ### Report Types
//! - [`ReportFrame`] - Ordered rows sharing a column set
//! - [`Value`] - Scalar cell value
//! - [`DateRange`] - Inclusive range of report days

pub mod error;
pub mod models;

// Re-export error types
pub use error::CoreError;

// Re-export all model types
pub use models::{
    // Platform types
    AccountId,
    ConnectionInfo,
    Platform,
    SubAccount,
    // Report types
    DateRange,
    ReportFrame,
    RowRef,
    Value,
    last_day_of_month,
    normalize_column_name,
};
