//! Report commands - fetch every account and write the combined report.

use std::collections::HashMap;
use std::path::PathBuf;

use adconnect_connectors::{ConnectorRegistry, ConnectorsConfig, CredentialResolver, Dv360Source, dv360_source};
use adconnect_core::{AccountId, CoreError, DateRange, Platform, ReportFrame};
use adconnect_fetch::{FailurePolicy, FetchContext, ReportAggregator, ReportSource};
use adconnect_store::{
    FileLayout, GeneralSettings, OutputFormat as FileFormat, ReportWriter, Settings, default_cache_dir,
};
use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Args;
use tracing::{info, warn};

use super::platform::{Dv360Args, PlatformArgs};
use crate::output::{JsonFormatter, RunOutput, TextFormatter};
use crate::{Cli, ExitCode, OutputFormat};

/// Options shared by every report subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct ReportArgs {
    /// First day, YYYY-MM-DD (default: yesterday).
    #[arg(short = 's', long, value_name = "DATE")]
    pub start_date: Option<String>,

    /// Last day, inclusive, YYYY-MM-DD (default: yesterday).
    #[arg(short = 'e', long, value_name = "DATE")]
    pub end_date: Option<String>,

    /// Output directory.
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Accounts to fetch (comma-separated; default: every sub-account).
    #[arg(long, value_delimiter = ',')]
    pub accounts: Vec<String>,

    /// Dimensions or metrics (comma-separated; default: platform defaults).
    #[arg(short = 'd', long, value_delimiter = ',')]
    pub dimensions: Vec<String>,

    /// One file per account.
    #[arg(long)]
    pub per_account: bool,

    /// Write tab-separated files.
    #[arg(long)]
    pub tsv: bool,

    /// Abort on the first failing account.
    #[arg(long)]
    pub fail_fast: bool,

    /// Maximum accounts fetched at once.
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,
}

impl ReportArgs {
    /// The requested range. Missing bounds default to yesterday relative to
    /// `today`.
    pub fn date_range(&self, today: NaiveDate) -> Result<DateRange> {
        let yesterday = today.pred_opt().unwrap_or(today);
        let start = parse_date(self.start_date.as_deref(), "--start-date")?;
        let end = parse_date(self.end_date.as_deref(), "--end-date")?;

        let end = end.unwrap_or_else(|| start.map_or(yesterday, |s| s.max(yesterday)));
        let start = start.unwrap_or_else(|| end.min(yesterday));
        Ok(DateRange::new(start, end)?)
    }

    /// Applies flag overrides to the run defaults.
    pub fn apply(&self, general: &mut GeneralSettings) {
        if let Some(dir) = &self.output {
            general.output_dir.clone_from(dir);
        }
        if self.per_account {
            general.layout = FileLayout::PerAccount;
        }
        if self.tsv {
            general.output_format = FileFormat::Tsv;
        }
        if self.fail_fast {
            general.failure_policy = FailurePolicy::FailFast;
        }
        if let Some(n) = self.concurrency {
            general.max_concurrency = Some(n.max(1));
        }
    }

    fn account_ids(&self) -> Vec<AccountId> {
        self.accounts
            .iter()
            .map(|a| a.trim())
            .filter(|a| !a.is_empty())
            .map(AccountId::from)
            .collect()
    }
}

fn parse_date(value: Option<&str>, flag: &str) -> Result<Option<NaiveDate>> {
    value
        .map(|v| {
            NaiveDate::parse_from_str(v.trim(), "%Y-%m-%d")
                .map_err(|_| CoreError::InvalidDateRange(format!("{flag} {v} is not YYYY-MM-DD")))
                .context("invalid date")
        })
        .transpose()
}

// ============================================================================
// Connector plumbing
// ============================================================================

/// Context for a run, honoring the configured timeout.
pub fn fetch_context(general: &GeneralSettings) -> FetchContext {
    FetchContext::builder()
        .timeout(general.request_timeout())
        .cache_dir(default_cache_dir())
        .build()
}

/// Resolves credentials and builds the platform's connector.
pub async fn connect(
    platform: Platform,
    flags: &HashMap<String, String>,
    config: &ConnectorsConfig,
    ctx: &FetchContext,
) -> Result<Box<dyn ReportSource>> {
    let desc = ConnectorRegistry::get(platform).ok_or_else(|| CoreError::UnknownPlatform(platform.to_string()))?;
    let credentials = CredentialResolver::new(ctx.keychain.clone())
        .resolve(platform, desc.credentials, flags, config)
        .await;
    let source = desc
        .connect(config, &credentials, ctx)
        .with_context(|| format!("connecting to {}", desc.display_name()))?;
    Ok(source)
}

// ============================================================================
// Run
// ============================================================================

/// Runs a report subcommand.
pub async fn run<A: PlatformArgs>(args: &A, mut settings: Settings, cli: &Cli) -> Result<ExitCode> {
    let platform = args.platform();
    let report = args.report();
    let range = report.date_range(Local::now().date_naive())?;
    report.apply(&mut settings.general);
    args.apply(&mut settings.connectors)?;

    let ctx = fetch_context(&settings.general);
    let source = connect(platform, &args.credential_flags(), &settings.connectors, &ctx).await?;

    let mut accounts = report.account_ids();
    if accounts.is_empty() {
        accounts = source
            .list_sub_accounts()
            .await
            .context("listing sub-accounts")?
            .into_iter()
            .map(|a| a.id)
            .collect();
    }
    info!(%platform, %range, accounts = accounts.len(), "Fetching report");

    let mut aggregator = ReportAggregator::new().with_policy(settings.general.failure_policy);
    if let Some(limit) = settings.general.max_concurrency {
        aggregator = aggregator.with_max_concurrency(limit);
    }
    let outcome = aggregator
        .run(source.as_ref(), &accounts, &range, &report.dimensions)
        .await?;
    for failed in outcome.accounts.iter().filter(|a| !a.is_success()) {
        warn!(account = %failed.account, error = failed.error.as_deref().unwrap_or_default(), "Account skipped");
    }

    let written = if outcome.frame.is_empty() {
        warn!(%platform, %range, "No data");
        Vec::new()
    } else {
        ReportWriter::from_settings(&settings.general)
            .with_append(args.append())
            .write(platform, &range, &outcome.frame)
            .await?
    };

    print_run(cli, &RunOutput::new(platform, &range, &outcome, &written))?;

    Ok(if written.is_empty() {
        ExitCode::NoData
    } else {
        ExitCode::Success
    })
}

/// Runs `dv360`, which can also create a query or download an existing one.
pub async fn run_dv360(args: &Dv360Args, mut settings: Settings, cli: &Cli) -> Result<ExitCode> {
    if !args.create && args.get.is_none() {
        return run(args, settings, cli).await;
    }

    let range = args.report.date_range(Local::now().date_naive())?;
    args.report.apply(&mut settings.general);
    args.apply(&mut settings.connectors)?;
    let ctx = fetch_context(&settings.general);
    let source: Dv360Source = dv360_source(&settings.connectors, &ctx).context("connecting to DV360")?;

    if let Some(query_id) = &args.get {
        let frame = source.latest_report(query_id).await?;
        return write_single(cli, &settings.general, Platform::Dv360, &range, frame).await;
    }

    let advertisers = args.report.account_ids();
    let mut ids = Vec::new();
    if advertisers.is_empty() {
        ids.push(source.create_query(&range, None, &args.report.dimensions).await?);
    } else {
        for advertiser in &advertisers {
            ids.push(
                source
                    .create_query(&range, Some(advertiser.as_str()), &args.report.dimensions)
                    .await?,
            );
        }
    }

    match cli.format {
        OutputFormat::Text => {
            for id in &ids {
                println!("{id}");
            }
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&serde_json::json!({ "query_ids": ids }))?);
        }
    }
    Ok(ExitCode::Success)
}

async fn write_single(
    cli: &Cli,
    general: &GeneralSettings,
    platform: Platform,
    range: &DateRange,
    frame: ReportFrame,
) -> Result<ExitCode> {
    if frame.is_empty() {
        warn!(%platform, "No data");
        return Ok(ExitCode::NoData);
    }
    let written = ReportWriter::from_settings(general).write(platform, range, &frame).await?;
    print_run(cli, &RunOutput::from_files(platform, range, &written))?;
    Ok(ExitCode::Success)
}

fn print_run(cli: &Cli, output: &RunOutput) -> Result<()> {
    if cli.quiet && cli.format == OutputFormat::Text {
        return Ok(());
    }
    match cli.format {
        OutputFormat::Text => println!("{}", TextFormatter::new(!cli.no_color).format_run(output)),
        OutputFormat::Json => println!("{}", JsonFormatter::new(cli.pretty).format(output)?),
    }
    Ok(())
}
