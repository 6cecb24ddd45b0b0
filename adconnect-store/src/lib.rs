// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]

//! # AdConnect Store
//!
//! Everything AdConnect keeps on disk.
//!
//! - **Settings**: the JSON settings file with run defaults and connector settings
//! - **Persistence**: atomic, owner-only JSON writes
//! - **ReportWriter**: CSV/TSV report files, combined or one per account
//!
//! ## Usage
//!
//! ```ignore
//! use adconnect_store::{ReportWriter, SettingsStore};
//!
//! let store = SettingsStore::load_default().await?;
//! let settings = store.get().await;
//!
//! let written = ReportWriter::from_settings(&settings.general)
//!     .write(platform, &range, &frame)
//!     .await?;
//! ```

pub mod error;
pub mod persistence;
pub mod settings;
pub mod writer;

pub use error::StoreError;
pub use persistence::{
    default_cache_dir, default_config_dir, default_settings_path, ensure_dir, load_json,
    load_json_or_default, save_json,
};
pub use settings::{FileLayout, GeneralSettings, LogLevel, OutputFormat, Settings, SettingsStore};
pub use writer::{ReportWriter, WrittenFile};
