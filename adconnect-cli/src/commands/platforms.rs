//! Platforms command - list supported platforms.

use adconnect_connectors::ConnectorRegistry;
use anyhow::Result;
use tracing::info;

use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, ExitCode, OutputFormat};

/// Runs the platforms command.
pub fn run(cli: &Cli) -> Result<ExitCode> {
    info!("Listing platforms");

    let connectors = ConnectorRegistry::all();

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);

            println!("{}", formatter.format_platforms_header());
            println!("{}", "─".repeat(70));

            for desc in connectors {
                println!("{}", formatter.format_platform_line(desc));
            }

            println!();
            println!(
                "Total: {} platforms ({} using Google OAuth)",
                connectors.len(),
                ConnectorRegistry::google_platforms().len()
            );
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format_platforms(connectors)?);
        }
    }

    Ok(ExitCode::Success)
}
