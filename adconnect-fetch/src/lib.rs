// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `AdConnect` Fetch
//!
//! Report aggregation, job polling, and host APIs for `AdConnect`.
//!
//! ## Host APIs
//!
//! The [`host`] module provides abstractions for system interactions:
//!
//! - [`host::keychain`] - Secure credential storage (system keychain)
//! - [`host::http`] - HTTP client with retries and domain allowlist
//! - [`host::token_cache`] - Cached OAuth tokens on disk
//!
//! ## Reports
//!
//! - [`source::ReportSource`] - Trait every platform connector implements
//! - [`aggregate::ReportAggregator`] - Concurrent multi-account aggregation
//! - [`poll::poll_until_ready`] - Poll a remote report job until it completes
//! - [`pace::RequestGate`] - Request spacing shared across accounts
//! - [`retry::RetryStrategy`] - Backoff for transient failures
//!
//! ## Example
//!
//! ```ignore
//! use adconnect_core::{AccountId, DateRange};
//! use adconnect_fetch::{FailurePolicy, ReportAggregator};
//!
//! let range = DateRange::parse("2022-01-01", "2022-01-31")?;
//! let accounts = vec![AccountId::new("act_1"), AccountId::new("act_2")];
//!
//! let outcome = ReportAggregator::new()
//!     .with_policy(FailurePolicy::Isolate)
//!     .run(&facebook, &accounts, &range, &["clicks".to_string()])
//!     .await?;
//!
//! println!("{} rows", outcome.frame.len());
//! ```

// Core modules
pub mod aggregate;
pub mod context;
pub mod error;
pub mod host;
pub mod pace;
pub mod poll;
pub mod retry;
pub mod source;

// Re-export key types at crate root

// Errors
pub use error::{FetchError, HttpError, KeychainError};

// Host APIs
pub use host::{
    http::{HttpClient, ResponseExt},
    keychain::{KeychainApi, MemoryKeychain, SystemKeychain},
    token_cache::{CachedToken, TokenCache},
};

// Reports
pub use aggregate::{
    ACCOUNT_COLUMN, AccountOutcome, AggregateOptions, AggregateOutcome, FailurePolicy,
    ReportAggregator, aggregate_reports,
};
pub use context::{FetchContext, FetchContextBuilder, FetchSettings};
pub use pace::RequestGate;
pub use poll::{PollPolicy, poll_until_ready};
pub use retry::{Backoff, RetryStrategy, retry_async};
pub use source::ReportSource;
