//! Host APIs for `AdConnect` connectors.
//!
//! This module provides abstractions for interacting with external systems:
//!
//! - [`keychain`] - Secure credential storage (system keychain)
//! - [`http`] - HTTP client with retries, status mapping, and domain allowlist
//! - [`token_cache`] - On-disk OAuth token cache

pub mod http;
pub mod keychain;
pub mod token_cache;

// Re-export key types
pub use http::{HttpClient, ResponseExt};
pub use keychain::{KeychainApi, MemoryKeychain, SystemKeychain};
pub use token_cache::{CachedToken, TokenCache};
