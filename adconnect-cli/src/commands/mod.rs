//! CLI command implementations.

pub mod accounts;
pub mod auth;
pub mod config;
pub mod platform;
pub mod platforms;
pub mod report;
