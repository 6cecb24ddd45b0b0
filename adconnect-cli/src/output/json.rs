//! JSON output formatting.

use std::time::Duration;

use adconnect_connectors::ConnectorDescriptor;
use adconnect_core::{DateRange, Platform};
use adconnect_fetch::{AccountOutcome, AggregateOutcome};
use adconnect_store::WrittenFile;
use anyhow::Result;
use serde::{Serialize, Serializer};

// ============================================================================
// Output Types
// ============================================================================

/// Summary of a report run.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOutput {
    pub platform: String,
    pub start_date: String,
    pub end_date: String,
    pub rows: usize,
    #[serde(serialize_with = "serialize_millis")]
    pub duration: Duration,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub accounts: Vec<AccountRunOutput>,
    pub files: Vec<FileOutput>,
}

/// One account's part of a run.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRunOutput {
    pub account: String,
    pub rows: usize,
    #[serde(serialize_with = "serialize_millis")]
    pub duration: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A written report file.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileOutput {
    pub path: String,
    pub rows: usize,
    pub appended: bool,
}

/// Platform info output.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformInfoOutput {
    pub id: Platform,
    pub display_name: String,
    pub cli_name: String,
    pub aliases: Vec<String>,
    pub description: String,
    pub google_oauth: bool,
    pub default_dimensions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs_url: Option<String>,
}

impl RunOutput {
    /// Summarizes an aggregated run and the files it produced.
    pub fn new(platform: Platform, range: &DateRange, outcome: &AggregateOutcome, files: &[WrittenFile]) -> Self {
        Self {
            accounts: outcome.accounts.iter().map(AccountRunOutput::from).collect(),
            rows: outcome.frame.len(),
            duration: outcome.duration,
            ..Self::from_files(platform, range, files)
        }
    }

    /// Summarizes a run that wrote files without per-account fetches.
    pub fn from_files(platform: Platform, range: &DateRange, files: &[WrittenFile]) -> Self {
        Self {
            platform: platform.cli_name().to_string(),
            start_date: range.start().to_string(),
            end_date: range.end().to_string(),
            rows: files.iter().map(|f| f.rows).sum(),
            duration: Duration::ZERO,
            accounts: Vec::new(),
            files: files
                .iter()
                .map(|f| FileOutput {
                    path: f.path.display().to_string(),
                    rows: f.rows,
                    appended: f.appended,
                })
                .collect(),
        }
    }

    /// Accounts whose fetch failed.
    pub fn failed(&self) -> usize {
        self.accounts.iter().filter(|a| a.error.is_some()).count()
    }
}

impl From<&AccountOutcome> for AccountRunOutput {
    fn from(outcome: &AccountOutcome) -> Self {
        Self {
            account: outcome.account.to_string(),
            rows: outcome.rows,
            duration: outcome.duration,
            error: outcome.error.clone(),
        }
    }
}

// ============================================================================
// Serialization helpers
// ============================================================================

fn serialize_millis<S>(d: &Duration, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

// ============================================================================
// JSON Formatter
// ============================================================================

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Formats any serializable value.
    pub fn format<T: Serialize>(&self, data: &T) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(data)?
        } else {
            serde_json::to_string(data)?
        };
        Ok(json)
    }

    /// Formats the platform list.
    pub fn format_platforms(&self, connectors: &[ConnectorDescriptor]) -> Result<String> {
        let outputs: Vec<PlatformInfoOutput> = connectors
            .iter()
            .map(|desc| PlatformInfoOutput {
                id: desc.id,
                display_name: desc.display_name().to_string(),
                cli_name: desc.cli_name().to_string(),
                aliases: desc.cli.aliases.iter().map(ToString::to_string).collect(),
                description: desc.metadata.description.to_string(),
                google_oauth: desc.id.uses_google_oauth(),
                default_dimensions: desc.default_dimensions(),
                docs_url: Some(desc.metadata.docs_url)
                    .filter(|u| !u.is_empty())
                    .map(ToString::to_string),
            })
            .collect();

        self.format(&outputs)
    }
}
