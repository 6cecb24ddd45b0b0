//! Config command - manage the settings file.

use adconnect_store::{SettingsStore, default_cache_dir, default_config_dir, default_settings_path};
use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use tracing::info;

use crate::output::JsonFormatter;
use crate::{Cli, ExitCode, OutputFormat};

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current settings with credentials masked.
    Show,

    /// Show configuration paths.
    Path,

    /// Write a settings file with defaults, unless one exists.
    Init,
}

/// Loads the settings file named by `--config`, or the default one.
pub async fn load_store(cli: &Cli) -> Result<SettingsStore> {
    let path = cli.config.clone().unwrap_or_else(default_settings_path);
    SettingsStore::load(path).await.context("loading settings")
}

/// Runs the config command.
pub async fn run(args: &ConfigArgs, store: &SettingsStore, cli: &Cli) -> Result<ExitCode> {
    match &args.action {
        ConfigAction::Show => show_config(store, cli).await?,
        ConfigAction::Path => show_paths(store, cli)?,
        ConfigAction::Init => init_config(store, cli).await?,
    }
    Ok(ExitCode::Success)
}

async fn show_config(store: &SettingsStore, cli: &Cli) -> Result<()> {
    let settings = store.get().await;

    match cli.format {
        OutputFormat::Text => {
            let general = &settings.general;
            println!("AdConnect Settings");
            println!("{}", "─".repeat(40));
            println!();
            println!("Settings file:   {}", store.path().display());
            println!("Output dir:      {}", general.output_dir.display());
            println!("Output format:   {:?}", general.output_format);
            println!("Layout:          {:?}", general.layout);
            println!("Failure policy:  {:?}", general.failure_policy);
            match general.max_concurrency {
                Some(n) => println!("Concurrency:     {n}"),
                None => println!("Concurrency:     unlimited"),
            }
            println!("Request timeout: {}s", general.request_timeout().as_secs());
            println!("Log level:       {}", general.log_level);
            println!();
            println!("Connector settings: adconnect config show --format json");
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&settings.redacted()?)?);
        }
    }

    Ok(())
}

fn show_paths(store: &SettingsStore, cli: &Cli) -> Result<()> {
    let config_dir = default_config_dir();
    let cache_dir = default_cache_dir();

    match cli.format {
        OutputFormat::Text => {
            println!("Configuration Paths");
            println!("{}", "─".repeat(40));
            println!();
            println!("Config dir:    {}", config_dir.display());
            println!("Settings file: {}", store.path().display());
            println!("Token cache:   {}", cache_dir.display());
        }
        OutputFormat::Json => {
            let paths = serde_json::json!({
                "config_dir": config_dir.display().to_string(),
                "settings_file": store.path().display().to_string(),
                "cache_dir": cache_dir.display().to_string(),
            });
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&paths)?);
        }
    }

    Ok(())
}

async fn init_config(store: &SettingsStore, cli: &Cli) -> Result<()> {
    let created = store.init().await?;
    if created {
        info!(path = %store.path().display(), "Settings file created");
    }
    if cli.quiet {
        return Ok(());
    }
    if created {
        println!("Created {}", store.path().display());
    } else {
        println!("Already exists: {}", store.path().display());
    }
    Ok(())
}
