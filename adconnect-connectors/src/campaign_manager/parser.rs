//! Extracts the data table from a Campaign Manager CSV file.

use adconnect_core::{CoreError, ReportFrame, Value};

const FIELDS_MARKER: &str = "Report Fields";
const TOTAL_MARKER: &str = "Grand Total:";

/// Lines between the `Report Fields` marker and the `Grand Total:` row.
///
/// Files without the marker are returned whole.
pub fn report_table(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines
        .iter()
        .position(|l| l.trim_start_matches('\u{feff}').starts_with(FIELDS_MARKER))
        .map_or(0, |i| i + 1);
    let end = lines[start..]
        .iter()
        .position(|l| l.starts_with(TOTAL_MARKER))
        .map_or(lines.len(), |i| start + i);
    lines[start..end].join("\n")
}

/// Parses a report file and tags each row with its report id.
pub fn parse_report(text: &str, report_id: &str) -> Result<ReportFrame, CoreError> {
    let mut frame = ReportFrame::from_csv_str(&report_table(text))?;
    if !frame.is_empty() {
        frame.set_constant("report_id", &Value::Text(report_id.to_string()));
    }
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILE: &str = "\
Acme Network
Report Time,2022-09-03 10:00:00
Date Range,2022-09-01 - 2022-09-02

Report Fields
Date,Campaign,Impressions,Clicks
2022-09-01,Spring,1200,15
2022-09-02,Spring,800,9
Grand Total:,,2000,24
";

    #[test]
    fn test_table_between_markers() {
        let frame = parse_report(FILE, "871396013").unwrap();
        assert_eq!(frame.len(), 2);
        assert_eq!(frame.columns(), ["Date", "Campaign", "Impressions", "Clicks", "report_id"]);
        assert_eq!(frame.get(1, "Clicks"), Some(&Value::Int(9)));
        assert_eq!(frame.get(0, "report_id"), Some(&Value::Text("871396013".into())));
    }

    #[test]
    fn test_without_markers() {
        let table = report_table("Date,Clicks\n2022-09-01,3\n");
        assert_eq!(table, "Date,Clicks\n2022-09-01,3");
    }

    #[test]
    fn test_empty_report() {
        let frame = parse_report("Report Fields\nDate,Clicks\nGrand Total:,0\n", "1").unwrap();
        assert!(frame.is_empty());
        assert!(!frame.has_column("report_id"));
    }
}
