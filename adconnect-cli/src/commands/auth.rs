//! Auth command - installed-app OAuth consent for the Google platforms.

use adconnect_connectors::ConnectorRegistry;
use adconnect_connectors::google::consent_client;
use adconnect_core::CoreError;
use adconnect_store::Settings;
use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use super::report::fetch_context;
use crate::{Cli, ExitCode, OutputFormat};
use crate::output::JsonFormatter;

/// Arguments for the auth command.
#[derive(Args, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub action: AuthAction,
}

/// Auth subcommands.
#[derive(Subcommand, Debug)]
pub enum AuthAction {
    /// Authorize a Google platform and cache its refresh token.
    Google {
        /// dv360, gcm, google-ads or google-analytics.
        platform: String,
    },
}

/// Runs the auth command.
pub async fn run(args: &AuthArgs, settings: Settings, cli: &Cli) -> Result<ExitCode> {
    match &args.action {
        AuthAction::Google { platform } => google(platform, &settings, cli).await,
    }
}

async fn google(name: &str, settings: &Settings, cli: &Cli) -> Result<ExitCode> {
    let desc = ConnectorRegistry::get_by_cli_name(name).ok_or_else(|| CoreError::UnknownPlatform(name.to_string()))?;
    if !desc.id.uses_google_oauth() {
        bail!("{} does not use Google OAuth", desc.display_name());
    }

    let ctx = fetch_context(&settings.general);
    let client = consent_client(desc.id, &settings.connectors, &ctx)?;
    let auth = client.auth();

    eprintln!("Open this URL in a browser and authorize {}:", desc.display_name());
    eprintln!();
    eprintln!("  {}", auth.authorization_url()?);
    eprintln!();
    eprint!("Authorization code: ");

    let mut code = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut code)
        .await
        .context("reading authorization code")?;
    let code = code.trim();
    if code.is_empty() {
        bail!("no authorization code given");
    }

    let token = auth.exchange_code(code).await?;
    let path = auth.cache().path();
    info!(platform = %desc.id, path = %path.display(), "Stored Google token");

    match cli.format {
        OutputFormat::Text => {
            println!("Token saved to {}", path.display());
            if token.refresh_token.is_none() {
                println!("No refresh token was issued; revoke the app's access and authorize again.");
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "platform": desc.cli_name(),
                "token_cache": path.display().to_string(),
                "refresh_token": token.refresh_token.is_some(),
            });
            println!("{}", JsonFormatter::new(cli.pretty).format(&output)?);
        }
    }
    Ok(ExitCode::Success)
}
