//! CLI output formatting tests.
//!
//! These tests verify that CLI output is correctly formatted for both
//! text and JSON output modes.

use std::path::PathBuf;
use std::time::Duration;

use adconnect_connectors::ConnectorRegistry;
use adconnect_core::{AccountId, ConnectionInfo, DateRange, Platform, ReportFrame, SubAccount, Value};
use adconnect_fetch::{AccountOutcome, AggregateOutcome};
use adconnect_store::WrittenFile;

use super::json::{JsonFormatter, RunOutput};
use super::text::TextFormatter;

fn range() -> DateRange {
    DateRange::parse("2022-01-01", "2022-01-31").unwrap()
}

fn outcome() -> AggregateOutcome {
    let mut frame = ReportFrame::new();
    frame.push_row([("date", Value::from("2022-01-01")), ("spend", Value::Int(3))]);
    frame.push_row([("date", Value::from("2022-01-02")), ("spend", Value::Int(4))]);

    AggregateOutcome {
        frame,
        accounts: vec![
            AccountOutcome::success(AccountId::from("act_1"), 2, Duration::from_millis(120)),
            AccountOutcome::success(AccountId::from("act_2"), 0, Duration::from_millis(80)),
            AccountOutcome::failure(AccountId::from("act_3"), "poll timed out", Duration::from_millis(900)),
        ],
        duration: Duration::from_millis(1500),
    }
}

fn written() -> Vec<WrittenFile> {
    vec![WrittenFile {
        path: PathBuf::from("out/fb_2022-01-01_2022-01-31.csv"),
        rows: 2,
        appended: false,
    }]
}

mod text_formatter_tests {
    use super::*;

    #[test]
    fn test_run_summary() {
        let formatter = TextFormatter::new(false);
        let run = RunOutput::new(Platform::Facebook, &range(), &outcome(), &written());

        let output = formatter.format_run(&run);

        assert!(output.starts_with("fb 2022-01-01 .. 2022-01-31"));
        assert!(output.contains("act_1"));
        assert!(output.contains("2 rows"));
        assert!(output.contains("no data"));
        assert!(output.contains("failed poll timed out"));
        assert!(output.contains("Wrote 2 rows to out/fb_2022-01-01_2022-01-31.csv"));
        assert!(output.contains("1 of 3 accounts failed"));
        assert!(output.contains("Done in 1.5s"));
    }

    #[test]
    fn test_run_summary_without_files() {
        let formatter = TextFormatter::new(false);
        let run = RunOutput::from_files(Platform::Twitter, &range(), &[]);

        let output = formatter.format_run(&run);
        assert!(output.contains("No data; nothing written"));
        assert!(!output.contains("Done in"));
    }

    #[test]
    fn test_colors_toggle() {
        let run = RunOutput::new(Platform::Facebook, &range(), &outcome(), &written());

        let plain = TextFormatter::new(false).format_run(&run);
        assert!(!plain.contains("\x1b["));

        let colored = TextFormatter::new(true).format_run(&run);
        assert!(colored.contains("\x1b[31m"), "failures should be red");
        assert!(colored.contains("\x1b[32m"), "rows should be green");
    }

    #[test]
    fn test_accounts() {
        let formatter = TextFormatter::new(false);
        let accounts = vec![
            SubAccount::new("act_1", "Acme US").with_currency("USD"),
            SubAccount::new("act_2", "Acme EU"),
        ];

        let output = formatter.format_accounts("Facebook", &accounts);
        assert!(output.contains("Facebook sub-accounts"));
        assert!(output.contains("Acme US (USD)"));
        assert!(output.contains("Total: 2"));

        let empty = formatter.format_accounts("Facebook", &[]);
        assert!(empty.contains("No accounts"));
    }

    #[test]
    fn test_connection() {
        let formatter = TextFormatter::new(false);
        let mut info = ConnectionInfo::new(Platform::LinkedIn, "Jane Doe");
        info.login_account_id = Some("urn:li:person:42".into());
        info.num_sub_account = 3;

        let output = formatter.format_connection(&info);
        assert!(output.contains("Login:        Jane Doe"));
        assert!(output.contains("urn:li:person:42"));
        assert!(output.contains("Sub-accounts: 3"));
    }

    #[test]
    fn test_platform_line() {
        let formatter = TextFormatter::new(false);
        let desc = ConnectorRegistry::get(Platform::CampaignManager).unwrap();

        let line = formatter.format_platform_line(desc);
        assert!(line.contains("gcm"));
        assert!(line.contains("google"));
        assert!(line.contains("cm360"));
    }
}

mod json_formatter_tests {
    use super::*;

    #[test]
    fn test_run_output_fields() {
        let run = RunOutput::new(Platform::Facebook, &range(), &outcome(), &written());
        let json = JsonFormatter::new(false).format(&run).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["platform"], "fb");
        assert_eq!(value["startDate"], "2022-01-01");
        assert_eq!(value["rows"], 2);
        assert_eq!(value["duration"], 1500);
        assert_eq!(value["accounts"][2]["error"], "poll timed out");
        assert!(value["accounts"][0].get("error").is_none());
        assert_eq!(value["files"][0]["appended"], false);
    }

    #[test]
    fn test_pretty_output() {
        let formatter = JsonFormatter::new(true);
        let output = formatter.format(&serde_json::json!({"a": 1})).unwrap();
        assert!(output.contains('\n'));

        let compact = JsonFormatter::new(false).format(&serde_json::json!({"a": 1})).unwrap();
        assert_eq!(compact, r#"{"a":1}"#);
    }

    #[test]
    fn test_platforms() {
        let json = JsonFormatter::new(false).format_platforms(ConnectorRegistry::all()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let platforms = value.as_array().unwrap();

        assert_eq!(platforms.len(), Platform::all().len());
        let trends = platforms.iter().find(|p| p["cliName"] == "gt").unwrap();
        assert_eq!(trends["id"], "google_trends");
        assert_eq!(trends["googleOauth"], false);
        let dv360 = platforms.iter().find(|p| p["cliName"] == "dv360").unwrap();
        assert_eq!(dv360["googleOauth"], true);
    }
}
