//! Text output formatting with colors.

use adconnect_connectors::ConnectorDescriptor;
use adconnect_core::{ConnectionInfo, SubAccount};

use super::json::RunOutput;

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    /// Formats the platform list header.
    pub fn format_platforms_header(&self) -> String {
        format!(
            "{:<24} {:<18} {:<8} {}",
            self.bold("Platform"),
            self.bold("CLI"),
            self.bold("OAuth"),
            self.bold("Aliases")
        )
    }

    /// Formats a single platform line.
    pub fn format_platform_line(&self, desc: &ConnectorDescriptor) -> String {
        let oauth = if desc.id.uses_google_oauth() {
            self.green("google")
        } else {
            self.dim("−")
        };
        let aliases = if desc.cli.aliases.is_empty() {
            "−".to_string()
        } else {
            desc.cli.aliases.join(", ")
        };

        format!(
            "{:<24} {:<18} {:<8} {}",
            desc.display_name(),
            desc.cli_name(),
            oauth,
            aliases
        )
    }

    /// Formats a platform's sub-accounts.
    pub fn format_accounts(&self, platform: &str, accounts: &[SubAccount]) -> String {
        let mut lines = Vec::new();

        lines.push(format!("{} sub-accounts", self.bold(platform)));
        lines.push("─".repeat(40));

        if accounts.is_empty() {
            lines.push(self.dim("No accounts"));
            return lines.join("\n");
        }

        for account in accounts {
            let mut line = format!("{:<24} {}", self.cyan(account.id.as_str()), account.name);
            if let Some(currency) = &account.currency {
                line.push_str(&format!(" {}", self.dim(&format!("({currency})"))));
            }
            lines.push(line);
        }
        lines.push(String::new());
        lines.push(format!("Total: {}", accounts.len()));

        lines.join("\n")
    }

    /// Formats a connection description.
    pub fn format_connection(&self, info: &ConnectionInfo) -> String {
        let mut lines = Vec::new();

        lines.push(self.bold(info.platform.display_name()));
        lines.push("─".repeat(40));
        lines.push(format!("Login:        {}", self.cyan(&info.login_account)));
        if let Some(id) = &info.login_account_id {
            lines.push(format!("Login ID:     {id}"));
        }
        lines.push(format!("Sub-accounts: {}", info.num_sub_account));

        lines.join("\n")
    }

    /// Formats a report run summary.
    pub fn format_run(&self, run: &RunOutput) -> String {
        let mut lines = Vec::new();

        lines.push(format!(
            "{} {} .. {}",
            self.bold(&run.platform),
            run.start_date,
            run.end_date
        ));

        for account in &run.accounts {
            let status = match &account.error {
                Some(e) => format!("{} {}", self.red("failed"), self.dim(e)),
                None if account.rows == 0 => self.dim("no data"),
                None => self.green(&format!("{} rows", account.rows)),
            };
            lines.push(format!("  {:<24} {}", account.account, status));
        }

        if run.files.is_empty() {
            lines.push(self.yellow("No data; nothing written"));
        }
        for file in &run.files {
            let verb = if file.appended { "Appended" } else { "Wrote" };
            lines.push(format!("{verb} {} rows to {}", file.rows, self.cyan(&file.path)));
        }

        let failed = run.failed();
        if failed > 0 {
            lines.push(self.yellow(&format!("{failed} of {} accounts failed", run.accounts.len())));
        }
        if !run.duration.is_zero() {
            lines.push(self.dim(&format!("Done in {:.1}s", run.duration.as_secs_f64())));
        }

        lines.join("\n")
    }

    // ========================================================================
    // Color/style helpers
    // ========================================================================

    fn paint(&self, code: &str, text: &str) -> String {
        if self.use_colors {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn bold(&self, text: &str) -> String {
        self.paint(BOLD, text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint(DIM, text)
    }

    fn green(&self, text: &str) -> String {
        self.paint(GREEN, text)
    }

    fn yellow(&self, text: &str) -> String {
        self.paint(YELLOW, text)
    }

    fn red(&self, text: &str) -> String {
        self.paint(RED, text)
    }

    fn cyan(&self, text: &str) -> String {
        self.paint(CYAN, text)
    }
}
