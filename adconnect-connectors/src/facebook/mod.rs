//! Facebook Marketing API connector.
//!
//! Insights are produced by asynchronous report runs: a job is created per
//! ad account, polled until Graph reports `Job Completed`, and its rows are
//! read back page by page.

mod api;
mod config;
mod descriptor;
mod error;
mod fetcher;

pub use api::{AdAccount, GRAPH_API_BASE, GraphClient, JobStatus, Me};
pub use config::FacebookConfig;
pub use descriptor::facebook_descriptor;
pub use error::GraphError;
pub use fetcher::FacebookSource;
