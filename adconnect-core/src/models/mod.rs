//! Domain models for `AdConnect`.
//!
//! ## Submodules
//!
//! - [`platform`] - Platform enum and account identity types
//! - [`dates`] - Inclusive date ranges and calendar helpers
//! - [`value`] - Scalar cell values
//! - [`frame`] - Report frames, concatenation, and column normalization

mod codec;
mod dates;
mod frame;
mod platform;
mod value;

// Re-export everything at the models level
pub use dates::{DateRange, last_day_of_month};
pub use frame::{ReportFrame, RowRef, normalize_column_name};
pub use platform::{AccountId, ConnectionInfo, Platform, SubAccount};
pub use value::Value;

#[cfg(test)]
mod serde_tests;
