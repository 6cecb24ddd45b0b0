//! GAQL query building and result flattening.

use adconnect_core::{DateRange, Value};
use serde_json::Map;

/// Builds the daily campaign query over `range`.
pub fn build_query(fields: &[String], range: &DateRange) -> String {
    format!(
        "SELECT {} FROM campaign WHERE segments.date BETWEEN '{}' AND '{}' ORDER BY segments.date DESC",
        fields.join(", "),
        range.start(),
        range.end()
    )
}

/// `cost_micros` → `costMicros`.
fn camel_case(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    let mut upper = false;
    for ch in segment.chars() {
        if ch == '_' {
            upper = true;
        } else if upper {
            out.extend(ch.to_uppercase());
            upper = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// Looks up a snake_case field path such as `metrics.cost_micros` in a
/// result row.
///
/// Int64 fields arrive as JSON strings and are parsed back to numbers.
pub fn field_value(row: &Map<String, serde_json::Value>, path: &str) -> Value {
    let mut segments = path.split('.');
    let Some(first) = segments.next() else {
        return Value::Null;
    };
    let mut current = row.get(&camel_case(first));
    for segment in segments {
        current = current.and_then(|v| v.get(camel_case(segment)));
    }
    match current {
        Some(serde_json::Value::String(s)) => Value::parse(s),
        Some(other) => Value::from_json(other),
        None => Value::Null,
    }
}
