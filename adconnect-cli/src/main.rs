// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! AdConnect CLI - pull advertising reports from the command line.
//!
//! # Examples
//!
//! ```bash
//! # Yesterday's Facebook insights for every ad account
//! adconnect fb --access-token EAAB...
//!
//! # A month of Trade Desk reports, one file per partner
//! adconnect ttd -u api-user -p secret --partner-ids tm90ejd -s 2022-01-01 -e 2022-01-31 --per-account
//!
//! # LinkedIn weekly rows appended to a TSV
//! adconnect linkedin --cred linkedin.json -c acme -q week
//!
//! # Google Trends daily interest
//! adconnect gt -k "running shoes,trail shoes" -s 2022-01-01 -e 2022-03-31
//!
//! # Store a Google refresh token, then list DV360 advertisers
//! adconnect auth google dv360
//! adconnect accounts dv360
//! ```

mod commands;
mod output;

use std::path::PathBuf;

use adconnect_core::CoreError;
use adconnect_fetch::FetchError;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use commands::platform::{
    CampaignManagerArgs, Dv360Args, FacebookArgs, GoogleAdsArgs, GoogleAnalyticsArgs, GoogleTrendsArgs,
    LinkedInArgs, TradeDeskArgs, TwitterArgs,
};
use commands::{accounts, auth, config, platforms, report};

// ============================================================================
// CLI Definition
// ============================================================================

/// AdConnect CLI - advertising report connectors.
#[derive(Parser)]
#[command(name = "adconnect")]
#[command(about = "Pull daily reports from advertising platforms")]
#[command(long_about = r#"
AdConnect pulls daily reports from advertising platforms into CSV files.
Every sub-account is fetched concurrently and the results are combined.

Platforms:
  • Facebook (fb)
  • The Trade Desk (ttd)
  • Twitter Ads (twitter)
  • LinkedIn (linkedin)
  • DV360 (dv360)
  • Campaign Manager 360 (gcm)
  • Google Ads (google-ads)
  • Google Analytics (google-analytics)
  • Google Trends (gt)

Credentials are taken from flags, then environment variables, then the
system keychain, then the settings file.
"#)]
#[command(version)]
pub struct Cli {
    /// Command to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Settings file (default: ~/.config/adconnect/config.json).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Output format for listing commands.
    #[arg(long, default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Verbose output (debug logs).
    #[arg(long, short)]
    pub verbose: bool,

    /// Quiet mode (warnings and errors only).
    #[arg(long, short)]
    pub quiet: bool,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Facebook Marketing API insights.
    #[command(name = "fb", visible_alias = "facebook")]
    Facebook(FacebookArgs),

    /// The Trade Desk scheduled report executions.
    #[command(name = "ttd", visible_alias = "tradedesk")]
    TradeDesk(TradeDeskArgs),

    /// Twitter Ads daily campaign stats.
    #[command(name = "twitter", visible_alias = "tw")]
    Twitter(TwitterArgs),

    /// LinkedIn campaign analytics.
    #[command(name = "linkedin", visible_alias = "ln")]
    LinkedIn(LinkedInArgs),

    /// DV360 Bid Manager queries.
    #[command(name = "dv360", visible_alias = "dv")]
    Dv360(Dv360Args),

    /// Campaign Manager 360 saved reports.
    #[command(name = "gcm", visible_aliases = ["campaign-manager", "cm360"])]
    CampaignManager(CampaignManagerArgs),

    /// Google Ads campaign performance.
    #[command(name = "google-ads", visible_alias = "ga")]
    GoogleAds(GoogleAdsArgs),

    /// Google Analytics views.
    #[command(name = "google-analytics", visible_alias = "google_analyst")]
    GoogleAnalytics(GoogleAnalyticsArgs),

    /// Google Trends interest over time.
    #[command(name = "gt", visible_alias = "trends")]
    GoogleTrends(GoogleTrendsArgs),

    /// List supported platforms.
    #[command(visible_alias = "p")]
    Platforms,

    /// List the sub-accounts a login can report on.
    Accounts(accounts::AccountsArgs),

    /// Describe the authenticated connection.
    Info(accounts::AccountsArgs),

    /// Authorize access to a platform.
    Auth(auth::AuthArgs),

    /// Manage the settings file.
    Config(config::ConfigArgs),
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// CLI exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success.
    Success = 0,
    /// General error.
    Error = 1,
    /// Credentials missing or rejected.
    AuthFailed = 2,
    /// Platform name not recognized.
    UnknownPlatform = 3,
    /// The run produced no rows.
    NoData = 4,
}

impl ExitCode {
    /// Exit code for an error that ended the run.
    pub fn for_error(err: &anyhow::Error) -> Self {
        for cause in err.chain() {
            if let Some(e) = cause.downcast_ref::<FetchError>() {
                return match e {
                    FetchError::AuthenticationFailed(_) | FetchError::MissingCredential(_) => Self::AuthFailed,
                    FetchError::Core(CoreError::UnknownPlatform(_)) => Self::UnknownPlatform,
                    _ => Self::Error,
                };
            }
            if let Some(CoreError::UnknownPlatform(_)) = cause.downcast_ref::<CoreError>() {
                return Self::UnknownPlatform;
            }
        }
        Self::Error
    }
}

// ============================================================================
// Logging Setup
// ============================================================================

/// Installs the stderr subscriber. `RUST_LOG` wins over the flags, and the
/// flags win over the settings file.
fn setup_logging(verbose: bool, quiet: bool, default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose {
            "debug"
        } else if quiet {
            "warn"
        } else {
            default_level
        };
        EnvFilter::new(format!(
            "adconnect={level},adconnect_fetch={level},adconnect_connectors={level},adconnect_store={level},warn"
        ))
    });

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let store = match config::load_store(&cli).await {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(ExitCode::Error as i32);
        }
    };
    let settings = store.get().await;
    setup_logging(cli.verbose, cli.quiet, &settings.general.log_level.to_string());

    let result = match &cli.command {
        Commands::Facebook(args) => report::run(args, settings, &cli).await,
        Commands::TradeDesk(args) => report::run(args, settings, &cli).await,
        Commands::Twitter(args) => report::run(args, settings, &cli).await,
        Commands::LinkedIn(args) => report::run(args, settings, &cli).await,
        Commands::Dv360(args) => report::run_dv360(args, settings, &cli).await,
        Commands::CampaignManager(args) => report::run(args, settings, &cli).await,
        Commands::GoogleAds(args) => report::run(args, settings, &cli).await,
        Commands::GoogleAnalytics(args) => report::run(args, settings, &cli).await,
        Commands::GoogleTrends(args) => report::run(args, settings, &cli).await,
        Commands::Platforms => platforms::run(&cli),
        Commands::Accounts(args) => accounts::run_accounts(args, settings, &cli).await,
        Commands::Info(args) => accounts::run_info(args, settings, &cli).await,
        Commands::Auth(args) => auth::run(args, settings, &cli).await,
        Commands::Config(args) => config::run(args, &store, &cli).await,
    };

    let code = match result {
        Ok(code) => code,
        Err(e) => {
            if !cli.quiet {
                eprintln!("Error: {e:#}");
            }
            ExitCode::for_error(&e)
        }
    };
    std::process::exit(code as i32);
}
