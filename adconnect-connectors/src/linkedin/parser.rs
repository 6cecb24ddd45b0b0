//! Builds report rows from campaign analytics.

use adconnect_core::{DateRange, ReportFrame, Value};
use chrono::{Datelike, Days};

use super::api::{AdAccount, Campaign, Money};
use super::config::QueryType;

/// LinkedIn rejects analytics requests with more fields than this.
pub const MAX_FIELDS_PER_REQUEST: usize = 20;

type Element = serde_json::Map<String, serde_json::Value>;

const ON_SITE: &[&str] = &["LEAD_GENERATION", "JOB_APPLICANT", "ENGAGEMENT", "TALENT_LEAD"];
const OFF_SITE: &[&str] = &[
    "WEBSITE_VISIT",
    "WEBSITE_CONVERSION",
    "BRAND_AWARENESS",
    "VIDEO_VIEW",
    "CREATIVE_ENGAGEMENT",
];

/// `on_site` or `off_site` for a campaign objective.
pub fn campaign_type(objective: &str) -> Option<&'static str> {
    if OFF_SITE.contains(&objective) {
        Some("off_site")
    } else if ON_SITE.contains(&objective) {
        Some("on_site")
    } else {
        None
    }
}

/// Splits metrics into comma-joined field lists LinkedIn accepts.
pub fn field_chunks(metrics: &[String]) -> Vec<String> {
    metrics
        .chunks(MAX_FIELDS_PER_REQUEST)
        .map(|chunk| chunk.join(","))
        .collect()
}

/// Merges the responses of each field chunk element by element.
pub fn merge_elements(responses: Vec<Vec<Element>>) -> Vec<Element> {
    let mut merged: Vec<Element> = Vec::new();
    for response in responses {
        for (i, element) in response.into_iter().enumerate() {
            match merged.get_mut(i) {
                Some(existing) => existing.extend(element),
                None => merged.push(element),
            }
        }
    }
    merged
}

/// Cell for a metric; nested and missing values are blank.
fn metric_value(element: &Element, metric: &str) -> Value {
    match element.get(metric) {
        Some(serde_json::Value::Array(_) | serde_json::Value::Object(_)) | None => Value::Text(String::new()),
        Some(value) => Value::from_json(value),
    }
}

fn money(value: Option<&Money>) -> Value {
    value.map_or(Value::Null, |m| Value::parse(&m.amount))
}

/// Period column for the query type, if any.
pub fn period_column(query_type: QueryType, range: &DateRange) -> Option<(&'static str, Value)> {
    let start = range.start();
    match query_type {
        QueryType::Day => None,
        QueryType::Week => {
            let day = start.checked_add_days(Days::new(1)).unwrap_or(start);
            Some(("week_number", Value::Int(i64::from(day.iso_week().week()))))
        }
        QueryType::Month => Some(("month", Value::Int(i64::from(start.month())))),
    }
}

/// Appends one row per analytics element of a campaign.
pub fn push_campaign_rows(
    frame: &mut ReportFrame,
    account: &AdAccount,
    campaign: &Campaign,
    elements: &[Element],
    range: &DateRange,
    query_type: QueryType,
    metrics: &[String],
) {
    let objective = campaign.objective_type.as_deref();
    let currency = account.currency.clone().or_else(|| {
        campaign
            .daily_budget
            .as_ref()
            .and_then(|b| b.currency_code.clone())
    });
    let period = period_column(query_type, range);

    for element in elements {
        let mut cells = vec![
            ("account_id".to_string(), Value::Int(account.id)),
            ("account_name".to_string(), Value::Text(account.name.clone())),
            ("campaign_id".to_string(), Value::Int(campaign.id)),
            ("campaign_name".to_string(), Value::Text(campaign.name.clone())),
            ("campaign_status".to_string(), Value::Text(campaign.status.clone())),
            ("objective_type".to_string(), objective.map_or(Value::Null, Value::from)),
            (
                "campaign_type".to_string(),
                objective
                    .and_then(campaign_type)
                    .map_or(Value::Null, Value::from),
            ),
            ("daily_budget".to_string(), money(campaign.daily_budget.as_ref())),
            ("unit_cost".to_string(), money(campaign.unit_cost.as_ref())),
            ("currency".to_string(), currency.clone().map_or(Value::Null, Value::Text)),
            ("start_date".to_string(), Value::Text(range.start().to_string())),
            ("end_date".to_string(), Value::Text(range.end().to_string())),
        ];
        if let Some((column, value)) = &period {
            cells.push(((*column).to_string(), value.clone()));
        }
        cells.extend(
            metrics
                .iter()
                .map(|metric| (metric.clone(), metric_value(element, metric))),
        );
        frame.push_row(cells);
    }
}
