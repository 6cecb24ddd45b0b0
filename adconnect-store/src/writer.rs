//! Report file output.
//!
//! File names follow `{platform}_{start}_{end}.{ext}` for combined output and
//! `{platform}_{account}_{start}_{end}.{ext}` per account. In append mode an
//! existing file gets rows only; the header is written when the file is new.

use std::path::{Path, PathBuf};

use adconnect_core::{DateRange, Platform, ReportFrame};
use adconnect_fetch::ACCOUNT_COLUMN;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::persistence::ensure_dir;
use crate::settings::{FileLayout, GeneralSettings, OutputFormat};

/// A file produced by a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFile {
    /// Where it was written.
    pub path: PathBuf,
    /// Data rows written, excluding the header.
    pub rows: usize,
    /// Whether rows were appended to an existing file.
    pub appended: bool,
}

/// Writes report frames to the output directory.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    dir: PathBuf,
    format: OutputFormat,
    layout: FileLayout,
    append: bool,
}

impl ReportWriter {
    /// Creates a writer for combined CSV files in `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            format: OutputFormat::Csv,
            layout: FileLayout::Combined,
            append: false,
        }
    }

    /// Creates a writer from the run defaults.
    pub fn from_settings(general: &GeneralSettings) -> Self {
        Self::new(&general.output_dir)
            .with_format(general.output_format)
            .with_layout(general.layout)
    }

    /// Sets the file encoding.
    #[must_use]
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets combined or per-account output.
    #[must_use]
    pub fn with_layout(mut self, layout: FileLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Appends to existing files instead of replacing them.
    #[must_use]
    pub fn with_append(mut self, append: bool) -> Self {
        self.append = append;
        self
    }

    /// The output directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name for a platform, optional account, and range.
    pub fn file_name(&self, platform: Platform, account: Option<&str>, range: &DateRange) -> String {
        let platform = platform.cli_name().replace('-', "_");
        let ext = self.format.extension();
        match account {
            Some(account) => format!(
                "{platform}_{}_{}_{}.{ext}",
                sanitize(account),
                range.start(),
                range.end()
            ),
            None => format!("{platform}_{}_{}.{ext}", range.start(), range.end()),
        }
    }

    /// Writes a frame according to the layout. A frame without columns
    /// produces no files.
    pub async fn write(
        &self,
        platform: Platform,
        range: &DateRange,
        frame: &ReportFrame,
    ) -> Result<Vec<WrittenFile>, StoreError> {
        if frame.columns().is_empty() {
            debug!(%platform, "Nothing to write");
            return Ok(Vec::new());
        }
        ensure_dir(&self.dir).await?;

        let mut written = Vec::new();
        match self.layout {
            FileLayout::Combined => {
                let path = self.dir.join(self.file_name(platform, None, range));
                written.push(self.write_file(&path, frame).await?);
            }
            FileLayout::PerAccount => {
                for (account, part) in split_by_account(frame) {
                    let path = self.dir.join(self.file_name(platform, Some(&account), range));
                    written.push(self.write_file(&path, &part).await?);
                }
            }
        }
        Ok(written)
    }

    async fn write_file(&self, path: &Path, frame: &ReportFrame) -> Result<WrittenFile, StoreError> {
        let appended = self.append && tokio::fs::try_exists(path).await?;

        let mut buf = Vec::new();
        frame.write_csv(&mut buf, self.format.delimiter(), !appended)?;

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .append(appended)
            .truncate(!appended)
            .open(path)
            .await?;
        file.write_all(&buf).await?;
        file.flush().await?;

        info!(path = %path.display(), rows = frame.len(), appended, "Wrote report");
        Ok(WrittenFile {
            path: path.to_path_buf(),
            rows: frame.len(),
            appended,
        })
    }
}

/// Splits a combined frame into one frame per account, in first-seen order.
///
/// Rows are keyed by the account column; a frame without one is keyed by its
/// account tag, or `all` when untagged.
fn split_by_account(frame: &ReportFrame) -> Vec<(String, ReportFrame)> {
    if !frame.has_column(ACCOUNT_COLUMN) {
        let key = frame
            .account()
            .map_or_else(|| "all".to_string(), |a| a.as_str().to_string());
        return vec![(key, frame.clone())];
    }

    let mut accounts: Vec<String> = Vec::new();
    for value in frame.column_values(ACCOUNT_COLUMN) {
        let key = value.to_string();
        if !accounts.contains(&key) {
            accounts.push(key);
        }
    }

    accounts
        .into_iter()
        .map(|account| {
            let mut part = frame.clone();
            part.retain(|row| row.get(ACCOUNT_COLUMN).map(ToString::to_string).as_deref() == Some(account.as_str()));
            (account, part)
        })
        .collect()
}

/// Keeps account ids filesystem-safe (`act_123`, `running shoes`).
fn sanitize(account: &str) -> String {
    account
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '_' })
        .collect()
}
