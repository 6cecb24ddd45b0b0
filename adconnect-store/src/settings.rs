//! The settings file.
//!
//! One JSON document holds the run defaults and every connector's settings.
//! Missing keys fall back to defaults, so a partial file is always valid.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use adconnect_connectors::ConnectorsConfig;
use adconnect_fetch::FailurePolicy;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::persistence::{default_settings_path, load_json, save_json};

/// Placeholder shown instead of secret values.
const REDACTED: &str = "********";

/// Keys whose values are never printed.
const SECRET_KEYS: &[&str] = &[
    "access_token",
    "access_token_secret",
    "consumer_secret",
    "developer_token",
    "password",
    "refresh_token",
    "client_secret",
];

// ============================================================================
// Settings Types
// ============================================================================

/// Report file encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Comma-separated.
    #[default]
    Csv,
    /// Tab-separated.
    Tsv,
}

impl OutputFormat {
    /// Field delimiter.
    pub fn delimiter(self) -> u8 {
        match self {
            OutputFormat::Csv => b',',
            OutputFormat::Tsv => b'\t',
        }
    }

    /// File extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Tsv => "tsv",
        }
    }
}

/// How a run's rows are split into files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileLayout {
    /// All accounts in one file.
    #[default]
    Combined,
    /// One file per account.
    PerAccount,
}

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    /// Errors only.
    Error,
    /// Warnings and errors.
    Warn,
    /// Progress messages.
    #[default]
    Info,
    /// Request-level detail.
    Debug,
    /// Everything.
    Trace,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        })
    }
}

/// Defaults for report runs. CLI flags override each of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Where report files are written.
    pub output_dir: PathBuf,
    /// CSV or TSV.
    pub output_format: OutputFormat,
    /// Combined or per-account files.
    pub layout: FileLayout,
    /// What a failing account does to the run.
    pub failure_policy: FailurePolicy,
    /// Maximum concurrent account fetches; unset means no limit.
    pub max_concurrency: Option<usize>,
    /// Log level when neither `RUST_LOG` nor a verbosity flag is given.
    pub log_level: LogLevel,
    /// Per-request HTTP timeout.
    pub request_timeout_secs: u64,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            output_format: OutputFormat::Csv,
            layout: FileLayout::Combined,
            failure_policy: FailurePolicy::Isolate,
            max_concurrency: None,
            log_level: LogLevel::Info,
            request_timeout_secs: 60,
        }
    }
}

impl GeneralSettings {
    /// The request timeout as a duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

/// Contents of the settings file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Run defaults.
    pub general: GeneralSettings,
    /// Per-platform connector settings.
    pub connectors: ConnectorsConfig,
}

impl Settings {
    /// JSON view of the settings with credential values masked.
    pub fn redacted(&self) -> Result<serde_json::Value, StoreError> {
        let mut value = serde_json::to_value(self)?;
        redact(&mut value);
        Ok(value)
    }
}

fn redact(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, inner) in map.iter_mut() {
                if SECRET_KEYS.contains(&key.as_str()) && !inner.is_null() {
                    *inner = serde_json::Value::String(REDACTED.to_string());
                } else {
                    redact(inner);
                }
            }
        }
        serde_json::Value::Array(items) => items.iter_mut().for_each(redact),
        _ => {}
    }
}

// ============================================================================
// Settings Store
// ============================================================================

/// The settings file and its loaded contents.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    settings: Arc<RwLock<Settings>>,
    path: PathBuf,
}

impl SettingsStore {
    /// Creates a store with default settings, backed by `path`.
    pub fn new(path: PathBuf) -> Self {
        Self {
            settings: Arc::new(RwLock::new(Settings::default())),
            path,
        }
    }

    /// Loads settings from the default path.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed.
    pub async fn load_default() -> Result<Self, StoreError> {
        Self::load(default_settings_path()).await
    }

    /// Loads settings from a path. A missing file yields defaults.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed.
    pub async fn load(path: PathBuf) -> Result<Self, StoreError> {
        let settings = match load_json::<Settings>(&path).await {
            Ok(settings) => {
                info!(path = %path.display(), "Loaded settings");
                settings
            }
            Err(e) if e.is_not_found() => {
                debug!(path = %path.display(), "Settings file not found, using defaults");
                Settings::default()
            }
            Err(StoreError::Serialization(e)) => {
                return Err(StoreError::InvalidSettings {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        };

        Ok(Self {
            settings: Arc::new(RwLock::new(settings)),
            path,
        })
    }

    /// Path of the settings file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gets a copy of the current settings.
    pub async fn get(&self) -> Settings {
        self.settings.read().await.clone()
    }

    /// Changes the in-memory settings. Call [`SettingsStore::save`] to persist.
    pub async fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut Settings),
    {
        let mut settings = self.settings.write().await;
        f(&mut settings);
    }

    /// Saves settings to disk.
    ///
    /// # Errors
    ///
    /// Returns error if settings cannot be written to disk.
    pub async fn save(&self) -> Result<(), StoreError> {
        let settings = self.settings.read().await;
        save_json(&self.path, &*settings).await?;
        info!(path = %self.path.display(), "Settings saved");
        Ok(())
    }

    /// Writes the current settings unless the file already exists.
    ///
    /// Returns whether a file was created.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be written.
    pub async fn init(&self) -> Result<bool, StoreError> {
        if tokio::fs::try_exists(&self.path).await? {
            debug!(path = %self.path.display(), "Settings file already exists");
            return Ok(false);
        }
        self.save().await?;
        Ok(true)
    }
}
