//! Per-platform report subcommand arguments.

use std::collections::HashMap;
use std::path::PathBuf;

use adconnect_connectors::ConnectorsConfig;
use adconnect_connectors::campaign_manager::ReportRef;
use adconnect_connectors::google::GoogleOAuthConfig;
use adconnect_connectors::google_trends::Resolution;
use adconnect_connectors::linkedin::QueryType;
use adconnect_core::Platform;
use anyhow::{Context, Result};
use clap::Args;

use super::report::ReportArgs;

/// What a platform subcommand contributes to a report run.
pub trait PlatformArgs {
    /// The platform.
    fn platform(&self) -> Platform;

    /// Shared report options.
    fn report(&self) -> &ReportArgs;

    /// Credentials given as flags, keyed like the connector's credentials.
    fn credential_flags(&self) -> HashMap<String, String> {
        HashMap::new()
    }

    /// Writes flag overrides into the connector settings.
    fn apply(&self, _config: &mut ConnectorsConfig) -> Result<()> {
        Ok(())
    }

    /// Whether rows are appended to existing files.
    fn append(&self) -> bool {
        false
    }
}

fn flags<const N: usize>(pairs: [(&str, &Option<String>); N]) -> HashMap<String, String> {
    pairs
        .into_iter()
        .filter_map(|(key, value)| value.clone().map(|v| (key.to_string(), v)))
        .collect()
}

fn set<T: Clone>(target: &mut T, value: Option<&T>) {
    if let Some(value) = value {
        target.clone_from(value);
    }
}

// ============================================================================
// Google OAuth
// ============================================================================

/// OAuth client flags shared by the Google platforms.
#[derive(Args, Debug, Clone, Default)]
pub struct GoogleOAuthArgs {
    /// OAuth client secrets JSON downloaded from the Cloud console.
    #[arg(long, value_name = "PATH")]
    pub client_secrets: Option<PathBuf>,

    /// Token cache file.
    #[arg(long, value_name = "PATH")]
    pub token_cache: Option<PathBuf>,
}

impl GoogleOAuthArgs {
    fn apply(&self, oauth: &mut GoogleOAuthConfig) {
        if let Some(path) = &self.client_secrets {
            oauth.client_secrets = Some(path.clone());
        }
        if let Some(path) = &self.token_cache {
            oauth.token_cache = Some(path.clone());
        }
    }
}

// ============================================================================
// Facebook
// ============================================================================

/// Arguments for `adconnect fb`.
#[derive(Args, Debug)]
pub struct FacebookArgs {
    #[command(flatten)]
    pub report: ReportArgs,

    /// Access token [env: FB_ACCESS_TOKEN].
    #[arg(long)]
    pub access_token: Option<String>,

    /// Graph API version, e.g. v17.0.
    #[arg(long)]
    pub api_version: Option<String>,
}

impl PlatformArgs for FacebookArgs {
    fn platform(&self) -> Platform {
        Platform::Facebook
    }

    fn report(&self) -> &ReportArgs {
        &self.report
    }

    fn credential_flags(&self) -> HashMap<String, String> {
        flags([("access_token", &self.access_token)])
    }

    fn apply(&self, config: &mut ConnectorsConfig) -> Result<()> {
        set(&mut config.facebook.api_version, self.api_version.as_ref());
        Ok(())
    }
}

// ============================================================================
// The Trade Desk
// ============================================================================

/// Arguments for `adconnect ttd`.
#[derive(Args, Debug)]
pub struct TradeDeskArgs {
    #[command(flatten)]
    pub report: ReportArgs,

    /// API login [env: TTD_USERNAME].
    #[arg(short = 'u', long)]
    pub username: Option<String>,

    /// API password [env: TTD_PASSWORD].
    #[arg(short = 'p', long)]
    pub password: Option<String>,

    /// Partners to report on (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub partner_ids: Vec<String>,

    /// Only download executions of this report schedule.
    #[arg(long)]
    pub report_schedule: Option<String>,
}

impl PlatformArgs for TradeDeskArgs {
    fn platform(&self) -> Platform {
        Platform::TradeDesk
    }

    fn report(&self) -> &ReportArgs {
        &self.report
    }

    fn credential_flags(&self) -> HashMap<String, String> {
        flags([("username", &self.username), ("password", &self.password)])
    }

    fn apply(&self, config: &mut ConnectorsConfig) -> Result<()> {
        if !self.partner_ids.is_empty() {
            config.tradedesk.partner_ids.clone_from(&self.partner_ids);
        }
        if self.report_schedule.is_some() {
            config.tradedesk.report_schedule.clone_from(&self.report_schedule);
        }
        Ok(())
    }
}

// ============================================================================
// Twitter
// ============================================================================

/// Arguments for `adconnect twitter`.
#[derive(Args, Debug)]
pub struct TwitterArgs {
    #[command(flatten)]
    pub report: ReportArgs,

    /// App consumer key [env: TWITTER_CONSUMER_KEY].
    #[arg(long)]
    pub consumer_key: Option<String>,

    /// App consumer secret [env: TWITTER_CONSUMER_SECRET].
    #[arg(long)]
    pub consumer_secret: Option<String>,

    /// User access token [env: TWITTER_ACCESS_TOKEN].
    #[arg(long)]
    pub access_token: Option<String>,

    /// User access token secret [env: TWITTER_ACCESS_TOKEN_SECRET].
    #[arg(long)]
    pub access_token_secret: Option<String>,
}

impl PlatformArgs for TwitterArgs {
    fn platform(&self) -> Platform {
        Platform::Twitter
    }

    fn report(&self) -> &ReportArgs {
        &self.report
    }

    fn credential_flags(&self) -> HashMap<String, String> {
        flags([
            ("consumer_key", &self.consumer_key),
            ("consumer_secret", &self.consumer_secret),
            ("access_token", &self.access_token),
            ("access_token_secret", &self.access_token_secret),
        ])
    }
}

// ============================================================================
// LinkedIn
// ============================================================================

/// Arguments for `adconnect linkedin`.
#[derive(Args, Debug)]
pub struct LinkedInArgs {
    #[command(flatten)]
    pub report: ReportArgs,

    /// Access token; overrides the credentials file [env: LINKEDIN_ACCESS_TOKEN].
    #[arg(long)]
    pub access_token: Option<String>,

    /// Credentials JSON keyed by client name.
    #[arg(long, value_name = "PATH")]
    pub cred: Option<PathBuf>,

    /// Entry of the credentials file to use.
    #[arg(short = 'c', long)]
    pub client_name: Option<String>,

    /// Period column: day, week or month.
    #[arg(short = 'q', long)]
    pub query_type: Option<String>,

    /// Append to existing report files; the header is written only for new files.
    #[arg(long)]
    pub append: bool,
}

impl PlatformArgs for LinkedInArgs {
    fn platform(&self) -> Platform {
        Platform::LinkedIn
    }

    fn report(&self) -> &ReportArgs {
        &self.report
    }

    fn credential_flags(&self) -> HashMap<String, String> {
        flags([("access_token", &self.access_token)])
    }

    fn apply(&self, config: &mut ConnectorsConfig) -> Result<()> {
        let linkedin = &mut config.linkedin;
        if self.cred.is_some() {
            linkedin.cred.clone_from(&self.cred);
        }
        if self.client_name.is_some() {
            linkedin.client_name.clone_from(&self.client_name);
        }
        if let Some(query_type) = &self.query_type {
            linkedin.query_type = query_type.parse::<QueryType>()?;
        }
        Ok(())
    }

    fn append(&self) -> bool {
        self.append
    }
}

// ============================================================================
// DV360
// ============================================================================

/// Arguments for `adconnect dv360`.
#[derive(Args, Debug)]
pub struct Dv360Args {
    #[command(flatten)]
    pub report: ReportArgs,

    #[command(flatten)]
    pub oauth: GoogleOAuthArgs,

    /// Create a query and print its id without running it.
    #[arg(long, conflicts_with = "get")]
    pub create: bool,

    /// Download the latest report of an existing query.
    #[arg(long, value_name = "QUERY_ID")]
    pub get: Option<String>,

    /// Schedule frequency of created queries.
    #[arg(long)]
    pub frequency: Option<String>,

    /// Hours after which a downloaded report is reported as stale.
    #[arg(long, value_name = "HOURS")]
    pub report_window: Option<u32>,
}

impl PlatformArgs for Dv360Args {
    fn platform(&self) -> Platform {
        Platform::Dv360
    }

    fn report(&self) -> &ReportArgs {
        &self.report
    }

    fn apply(&self, config: &mut ConnectorsConfig) -> Result<()> {
        self.oauth.apply(&mut config.dv360.oauth);
        set(&mut config.dv360.frequency, self.frequency.as_ref());
        set(&mut config.dv360.report_window_hours, self.report_window.as_ref());
        Ok(())
    }
}

// ============================================================================
// Campaign Manager
// ============================================================================

/// Arguments for `adconnect gcm`.
#[derive(Args, Debug)]
pub struct CampaignManagerArgs {
    #[command(flatten)]
    pub report: ReportArgs,

    #[command(flatten)]
    pub oauth: GoogleOAuthArgs,

    /// Saved report as profile_id:report_id (repeatable).
    #[arg(long = "report", value_name = "PROFILE:REPORT")]
    pub reports: Vec<String>,
}

impl PlatformArgs for CampaignManagerArgs {
    fn platform(&self) -> Platform {
        Platform::CampaignManager
    }

    fn report(&self) -> &ReportArgs {
        &self.report
    }

    fn apply(&self, config: &mut ConnectorsConfig) -> Result<()> {
        self.oauth.apply(&mut config.campaign_manager.oauth);
        if !self.reports.is_empty() {
            config.campaign_manager.reports = self
                .reports
                .iter()
                .map(|r| r.parse::<ReportRef>())
                .collect::<Result<_, _>>()
                .context("invalid --report")?;
        }
        Ok(())
    }
}

// ============================================================================
// Google Ads
// ============================================================================

/// Arguments for `adconnect google-ads`.
#[derive(Args, Debug)]
pub struct GoogleAdsArgs {
    #[command(flatten)]
    pub report: ReportArgs,

    #[command(flatten)]
    pub oauth: GoogleOAuthArgs,

    /// Developer token [env: GOOGLE_ADS_DEVELOPER_TOKEN].
    #[arg(long)]
    pub developer_token: Option<String>,

    /// Manager (MCC) account whose client accounts are reported on.
    #[arg(long)]
    pub manager_account: Option<String>,

    /// google-ads.yaml with the developer token and OAuth client.
    #[arg(long, value_name = "PATH")]
    pub yaml: Option<PathBuf>,
}

impl PlatformArgs for GoogleAdsArgs {
    fn platform(&self) -> Platform {
        Platform::GoogleAds
    }

    fn report(&self) -> &ReportArgs {
        &self.report
    }

    fn credential_flags(&self) -> HashMap<String, String> {
        flags([("developer_token", &self.developer_token)])
    }

    fn apply(&self, config: &mut ConnectorsConfig) -> Result<()> {
        let ads = &mut config.google_ads;
        self.oauth.apply(&mut ads.oauth);
        if self.manager_account.is_some() {
            ads.manager_account.clone_from(&self.manager_account);
        }
        if self.yaml.is_some() {
            ads.yaml.clone_from(&self.yaml);
        }
        Ok(())
    }
}

// ============================================================================
// Google Analytics
// ============================================================================

/// Arguments for `adconnect google-analytics`.
#[derive(Args, Debug)]
pub struct GoogleAnalyticsArgs {
    #[command(flatten)]
    pub report: ReportArgs,

    #[command(flatten)]
    pub oauth: GoogleOAuthArgs,

    /// Only report on these views (repeatable or comma-separated).
    #[arg(long = "view-id", value_delimiter = ',')]
    pub view_ids: Vec<String>,
}

impl PlatformArgs for GoogleAnalyticsArgs {
    fn platform(&self) -> Platform {
        Platform::GoogleAnalytics
    }

    fn report(&self) -> &ReportArgs {
        &self.report
    }

    fn apply(&self, config: &mut ConnectorsConfig) -> Result<()> {
        self.oauth.apply(&mut config.google_analytics.oauth);
        if !self.view_ids.is_empty() {
            config.google_analytics.view_ids.clone_from(&self.view_ids);
        }
        Ok(())
    }
}

// ============================================================================
// Google Trends
// ============================================================================

/// Arguments for `adconnect gt`.
#[derive(Args, Debug)]
pub struct GoogleTrendsArgs {
    #[command(flatten)]
    pub report: ReportArgs,

    /// Keywords (comma-separated).
    #[arg(short = 'k', long = "keyword", value_delimiter = ',')]
    pub keywords: Vec<String>,

    /// Market, e.g. US or US-CA.
    #[arg(long)]
    pub geo: Option<String>,

    /// Interest by region instead of the daily series.
    #[arg(long)]
    pub region: bool,

    /// Region granularity: COUNTRY, REGION, CITY or DMA.
    #[arg(long)]
    pub resolution: Option<String>,

    /// Seconds to wait between monthly requests.
    #[arg(long, value_name = "SECS")]
    pub wait_time: Option<f64>,
}

impl PlatformArgs for GoogleTrendsArgs {
    fn platform(&self) -> Platform {
        Platform::GoogleTrends
    }

    fn report(&self) -> &ReportArgs {
        &self.report
    }

    fn apply(&self, config: &mut ConnectorsConfig) -> Result<()> {
        let trends = &mut config.google_trends;
        if !self.keywords.is_empty() {
            trends.keywords = self
                .keywords
                .iter()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect();
        }
        set(&mut trends.geo, self.geo.as_ref());
        set(&mut trends.wait_time_secs, self.wait_time.as_ref());
        if self.region {
            trends.region = true;
        }
        if let Some(resolution) = &self.resolution {
            trends.resolution = resolution.parse::<Resolution>()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness<A: clap::Args> {
        #[command(flatten)]
        args: A,
    }

    fn parse<A: clap::Args>(argv: &[&str]) -> A {
        let mut full = vec!["adconnect"];
        full.extend_from_slice(argv);
        Harness::<A>::try_parse_from(full).unwrap().args
    }

    #[test]
    fn test_tradedesk_flags() {
        let args: TradeDeskArgs = parse(&["-u", "api-user", "-p", "hunter2", "--partner-ids", "a1,b2"]);
        let creds = args.credential_flags();
        assert_eq!(creds["username"], "api-user");
        assert_eq!(creds["password"], "hunter2");

        let mut config = ConnectorsConfig::default();
        args.apply(&mut config).unwrap();
        assert_eq!(config.tradedesk.partner_ids, vec!["a1".to_string(), "b2".to_string()]);
        assert_eq!(config.tradedesk.report_schedule, None);
    }

    #[test]
    fn test_flags_leave_settings_alone_when_absent() {
        let args: FacebookArgs = parse(&[]);
        let mut config = ConnectorsConfig::default();
        config.facebook.api_version = "v16.0".into();

        args.apply(&mut config).unwrap();
        assert_eq!(config.facebook.api_version, "v16.0");
        assert!(args.credential_flags().is_empty());
    }

    #[test]
    fn test_campaign_manager_reports() {
        let args: CampaignManagerArgs = parse(&["--report", "123:456", "--report", "123:789", "--client-secrets", "cs.json"]);
        let mut config = ConnectorsConfig::default();
        args.apply(&mut config).unwrap();

        assert_eq!(config.campaign_manager.reports.len(), 2);
        assert_eq!(config.campaign_manager.reports[1].report_id, "789");
        assert_eq!(config.campaign_manager.oauth.client_secrets, Some(PathBuf::from("cs.json")));

        let bad: CampaignManagerArgs = parse(&["--report", "123"]);
        assert!(bad.apply(&mut config).is_err());
    }

    #[test]
    fn test_trends_flags() {
        let args: GoogleTrendsArgs = parse(&["-k", "running shoes, trail shoes", "--geo", "US-CA", "--region", "--resolution", "dma"]);
        let mut config = ConnectorsConfig::default();
        args.apply(&mut config).unwrap();

        let trends = &config.google_trends;
        assert_eq!(trends.keywords, vec!["running shoes".to_string(), "trail shoes".to_string()]);
        assert_eq!(trends.geo, "US-CA");
        assert!(trends.region);
        assert_eq!(trends.resolution, Resolution::Dma);
    }

    #[test]
    fn test_linkedin_query_type() {
        let args: LinkedInArgs = parse(&["-q", "month", "-c", "acme", "--append"]);
        let mut config = ConnectorsConfig::default();
        args.apply(&mut config).unwrap();

        assert_eq!(config.linkedin.query_type, QueryType::Month);
        assert_eq!(config.linkedin.client_name.as_deref(), Some("acme"));
        assert!(args.append());

        let bad: LinkedInArgs = parse(&["-q", "hourly"]);
        assert!(bad.apply(&mut config).is_err());
    }
}
