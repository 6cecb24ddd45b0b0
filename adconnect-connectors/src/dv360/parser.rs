//! Cleans a downloaded DV360 CSV report.

use std::sync::LazyLock;

use adconnect_core::{CoreError, ReportFrame, Value};
use regex::Regex;

/// Data rows start with a `YYYY/MM/DD` date; the summary footer does not.
static REPORT_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}/\d{2}/\d{2}").expect("Invalid regex"));

/// Parses a report, keeping dated rows and adding `date_start`/`date_stop`.
pub fn parse_report(csv: &str) -> Result<ReportFrame, CoreError> {
    let mut frame = ReportFrame::from_csv_str(csv)?;
    frame.retain(|row| {
        row.get("Date")
            .and_then(Value::as_str)
            .is_some_and(|d| REPORT_DATE_RE.is_match(d))
    });
    frame.normalize_columns();
    if frame.rename_column("date", "date_start") {
        frame.map_column("date_start", |v| match v.as_str() {
            Some(d) => Value::Text(d.replace('/', "-")),
            None => v.clone(),
        });
        frame.copy_column("date_start", "date_stop");
    }
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = "\
Date,Advertiser ID,Advertiser,Clicks,Impressions
2022/09/01,1234567,Acme,15,1200
2022/09/02,1234567,Acme,9,800
,,,24,2000

Report Time:,2022/09/03 10:00
Date Range:,2022/09/01 to 2022/09/02
";

    #[test]
    fn test_keeps_dated_rows() {
        let frame = parse_report(REPORT).unwrap();
        assert_eq!(frame.len(), 2);
        assert_eq!(frame.columns()[0], "date_start");
        assert!(frame.has_column("advertiser_id"));
        assert_eq!(frame.get(1, "date_start"), Some(&Value::Text("2022-09-02".into())));
        assert_eq!(frame.get(1, "date_stop"), Some(&Value::Text("2022-09-02".into())));
        assert_eq!(frame.get(0, "clicks"), Some(&Value::Int(15)));
    }

    #[test]
    fn test_report_without_rows() {
        let frame = parse_report("Date,Clicks\n,0\n").unwrap();
        assert!(frame.is_empty());
    }
}
