//! Accounts and info commands - inspect what a login can reach.

use std::collections::HashMap;

use adconnect_connectors::{ConnectorDescriptor, ConnectorRegistry};
use adconnect_core::CoreError;
use adconnect_store::Settings;
use anyhow::Result;
use clap::Args;
use tracing::info;

use super::report::{connect, fetch_context};
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, ExitCode, OutputFormat};

/// Arguments for `accounts` and `info`.
#[derive(Args, Debug)]
pub struct AccountsArgs {
    /// Platform CLI name or alias (see `adconnect platforms`).
    pub platform: String,
}

impl AccountsArgs {
    fn descriptor(&self) -> Result<&'static ConnectorDescriptor, CoreError> {
        ConnectorRegistry::get_by_cli_name(&self.platform)
            .ok_or_else(|| CoreError::UnknownPlatform(self.platform.clone()))
    }
}

/// Lists sub-accounts.
pub async fn run_accounts(args: &AccountsArgs, settings: Settings, cli: &Cli) -> Result<ExitCode> {
    let desc = args.descriptor()?;
    info!(platform = %desc.id, "Listing sub-accounts");

    let ctx = fetch_context(&settings.general);
    let source = connect(desc.id, &HashMap::new(), &settings.connectors, &ctx).await?;
    let accounts = source.list_sub_accounts().await?;

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_accounts(desc.display_name(), &accounts));
        }
        OutputFormat::Json => {
            println!("{}", JsonFormatter::new(cli.pretty).format(&accounts)?);
        }
    }

    Ok(if accounts.is_empty() {
        ExitCode::NoData
    } else {
        ExitCode::Success
    })
}

/// Describes the authenticated connection.
pub async fn run_info(args: &AccountsArgs, settings: Settings, cli: &Cli) -> Result<ExitCode> {
    let desc = args.descriptor()?;
    let ctx = fetch_context(&settings.general);
    let source = connect(desc.id, &HashMap::new(), &settings.connectors, &ctx).await?;
    let connection = source.describe_connection().await?;

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_connection(&connection));
        }
        OutputFormat::Json => {
            println!("{}", JsonFormatter::new(cli.pretty).format(&connection)?);
        }
    }
    Ok(ExitCode::Success)
}

#[cfg(test)]
mod tests {
    use super::*;
    use adconnect_core::Platform;

    #[test]
    fn test_descriptor_accepts_aliases() {
        let args = AccountsArgs { platform: "cm360".into() };
        assert_eq!(args.descriptor().unwrap().id, Platform::CampaignManager);

        let args = AccountsArgs { platform: "myspace".into() };
        assert!(matches!(args.descriptor(), Err(CoreError::UnknownPlatform(p)) if p == "myspace"));
    }
}
