//! The report source trait implemented by every platform connector.

use adconnect_core::{AccountId, ConnectionInfo, DateRange, Platform, ReportFrame, SubAccount};
use async_trait::async_trait;

use crate::error::FetchError;

/// A platform that can list accounts and produce per-account report frames.
///
/// Aggregation across accounts is implemented once, in
/// [`crate::aggregate`], against this trait.
#[async_trait]
pub trait ReportSource: Send + Sync {
    /// The platform this source talks to.
    fn platform(&self) -> Platform;

    /// Dimensions (fields, metrics, metric groups) requested when the caller
    /// names none.
    fn default_dimensions(&self) -> Vec<String> {
        Vec::new()
    }

    /// Lists the accounts reachable from the current login.
    async fn list_sub_accounts(&self) -> Result<Vec<SubAccount>, FetchError>;

    /// Describes the authenticated connection.
    async fn describe_connection(&self) -> Result<ConnectionInfo, FetchError>;

    /// Fetches one account's report over an inclusive date range.
    ///
    /// Returning an empty frame means "no data"; the aggregator drops it.
    async fn fetch_report(
        &self,
        account: &AccountId,
        range: &DateRange,
        dimensions: &[String],
    ) -> Result<ReportFrame, FetchError>;
}
