//! Turns Reporting API pages into a frame.

use adconnect_core::{ReportFrame, Value};
use chrono::NaiveDate;

use super::api::Report;

/// Drops the `ga:` namespace from a column name.
pub fn column_name(name: &str) -> &str {
    name.strip_prefix("ga:").unwrap_or(name)
}

/// Adds the `ga:` namespace when missing.
pub fn metric_expression(name: &str) -> String {
    if name.starts_with("ga:") {
        name.to_string()
    } else {
        format!("ga:{name}")
    }
}

/// `ga:date` values are `YYYYMMDD`; they are written as ISO dates.
fn dimension_value(column: &str, raw: &str) -> Value {
    if column == "date" {
        if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y%m%d") {
            return Value::Text(day.to_string());
        }
    }
    Value::Text(raw.to_string())
}

/// Dimension columns then metric columns, one row per report row.
pub fn report_frame(pages: &[Report]) -> ReportFrame {
    let mut frame = ReportFrame::new();

    for page in pages {
        let header = &page.column_header;
        let dimensions: Vec<&str> = header.dimensions.iter().map(|d| column_name(d)).collect();
        let metrics: Vec<&str> = header
            .metric_header
            .metric_header_entries
            .iter()
            .map(|m| column_name(&m.name))
            .collect();

        for row in &page.data.rows {
            let dimension_cells = dimensions
                .iter()
                .zip(&row.dimensions)
                .map(|(col, raw)| (*col, dimension_value(col, raw)));
            let metric_cells = metrics.iter().zip(
                row.metrics
                    .first()
                    .map(|m| m.values.as_slice())
                    .unwrap_or_default(),
            );
            frame.push_row(dimension_cells.chain(metric_cells.map(|(col, raw)| (*col, Value::parse(raw)))));
        }
    }

    frame
}
