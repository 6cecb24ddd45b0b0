//! Daily rescaling and region frames.

use std::collections::BTreeMap;

use adconnect_core::{DateRange, ReportFrame, Value};
use chrono::NaiveDate;

use super::api::{GeoPoint, TimelinePoint};

/// Interest per day, skipping points without a date or value.
pub fn series(points: &[TimelinePoint]) -> BTreeMap<NaiveDate, i64> {
    points
        .iter()
        .filter_map(|p| Some((p.date()?, p.interest()?)))
        .collect()
}

/// Joins daily values with the monthly series and rescales them.
///
/// Each day carries the most recent monthly value at or before it. The
/// scaled value is `unscaled * monthly / 100`. Days outside `range` are
/// dropped.
#[allow(clippy::cast_precision_loss)]
pub fn scaled_frame(
    keyword: &str,
    daily: &BTreeMap<NaiveDate, i64>,
    monthly: &BTreeMap<NaiveDate, i64>,
    range: &DateRange,
) -> ReportFrame {
    let unscaled_col = format!("{keyword}_unscaled");
    let monthly_col = format!("{keyword}_monthly");
    let mut frame = ReportFrame::new();

    for (day, unscaled) in daily.range(range.start()..=range.end()) {
        let current = monthly.range(..=*day).next_back().map(|(_, v)| *v);

        let scale = current.map(|m| m as f64 / 100.0);
        frame.push_row([
            ("date", Value::Text(day.to_string())),
            (unscaled_col.as_str(), Value::Int(*unscaled)),
            (monthly_col.as_str(), current.map_or(Value::Null, Value::Int)),
            ("scale", scale.map_or(Value::Null, Value::Float)),
            (keyword, scale.map_or(Value::Null, |s| Value::Float(*unscaled as f64 * s))),
        ]);
    }

    frame
}

/// One row per region.
pub fn region_frame(keyword: &str, points: &[GeoPoint]) -> ReportFrame {
    let mut frame = ReportFrame::new();
    for point in points {
        frame.push_row([
            ("geo_name", Value::Text(point.geo_name.clone())),
            (
                "geo_code",
                point.geo_code.clone().map_or(Value::Null, Value::Text),
            ),
            (keyword, point.value.first().map_or(Value::Null, |v| Value::Int(*v))),
        ]);
    }
    frame
}
