//! Turns campaign stats into report rows.

use std::collections::HashMap;

use adconnect_core::{ReportFrame, Value};
use chrono::NaiveDate;

use super::api::{Campaign, LineItem, StatsEntry};

/// Micros per currency unit.
const MICROS: f64 = 1_000_000.0;

/// Keeps ratios finite when the denominator is zero.
const EPSILON: f64 = 1.0e-6;

/// Campaign attributes joined onto each stats row.
#[derive(Debug, Clone, Default)]
pub struct CampaignInfo {
    /// The campaign.
    pub campaign: Campaign,
    /// Objective of the campaign's first line item.
    pub objective: Option<String>,
    /// Status of the first line item, else of the campaign.
    pub status: Option<String>,
}

/// Joins campaigns with their first line item.
pub fn campaign_index(campaigns: Vec<Campaign>, line_items: &[LineItem]) -> HashMap<String, CampaignInfo> {
    let mut first_items: HashMap<&str, &LineItem> = HashMap::new();
    for item in line_items {
        first_items.entry(item.campaign_id.as_str()).or_insert(item);
    }

    campaigns
        .into_iter()
        .map(|campaign| {
            let item = first_items.get(campaign.id.as_str());
            let info = CampaignInfo {
                objective: item.and_then(|i| i.objective.clone()),
                status: item
                    .and_then(|i| i.entity_status.clone())
                    .or_else(|| campaign.entity_status.clone()),
                campaign,
            };
            (info.campaign.id.clone(), info)
        })
        .collect()
}

/// Display label of an objective.
pub fn objective_label(objective: &str) -> String {
    match objective {
        "VIDEO_VIEWS" => "Video views".to_string(),
        "CUSTOM" => "Custom".to_string(),
        "ENGAGEMENTS" => "Engagements".to_string(),
        "WEBSITE_CLICKS" => "Website clicks".to_string(),
        other => other.to_string(),
    }
}

/// Result type of an objective and the metric that counts it.
///
/// Objectives without a known result type get an empty label and count
/// link clicks.
pub fn result_type(objective: Option<&str>) -> (&'static str, &'static str) {
    match objective {
        Some("WEBSITE_CLICKS") => ("Link clicks", "url_clicks"),
        Some("VIDEO_VIEWS") => ("Video views", "video_total_views"),
        Some("ENGAGEMENTS" | "CUSTOM") => ("Tweet engagements", "engagements"),
        _ => ("", "url_clicks"),
    }
}

fn labelled(result_label: &str, label: impl FnOnce(&str) -> String) -> Value {
    if result_label.is_empty() {
        Value::Text(String::new())
    } else {
        Value::Text(label(result_label))
    }
}

/// Sum of a metric's buckets; null or missing metrics count as zero.
pub fn metric_sum(metrics: &serde_json::Map<String, serde_json::Value>, name: &str) -> i64 {
    metrics
        .get(name)
        .and_then(serde_json::Value::as_array)
        .map_or(0, |buckets| buckets.iter().filter_map(serde_json::Value::as_i64).sum())
}

#[allow(clippy::cast_precision_loss)]
fn micros(value: i64) -> f64 {
    value as f64 / MICROS
}

fn text(value: Option<&String>) -> Value {
    value.map_or(Value::Null, |s| Value::Text(s.clone()))
}

/// Appends one row per campaign with stats for `day`.
#[allow(clippy::cast_precision_loss)]
pub fn push_stats_rows(
    frame: &mut ReportFrame,
    campaigns: &HashMap<String, CampaignInfo>,
    stats: &[StatsEntry],
    day: NaiveDate,
    account_name: &str,
) {
    for entry in stats {
        let Some(data) = entry.id_data.first() else {
            continue;
        };
        let info = campaigns.get(&entry.id).cloned().unwrap_or_default();
        let metrics = &data.metrics;

        let impressions = metric_sum(metrics, "impressions");
        let spend = micros(metric_sum(metrics, "billed_charge_local_micro"));
        let (result_label, result_metric) = result_type(info.objective.as_deref());
        let results = metric_sum(metrics, result_metric);
        let result_rate = 100.0 * results as f64 / (EPSILON + impressions as f64);
        let cost_per_result = spend / (EPSILON + results as f64);

        let campaign = &info.campaign;
        frame.push_row([
            ("date_start", Value::Text(day.to_string())),
            ("date_stop", Value::Text(day.to_string())),
            ("campaign_id", Value::Text(entry.id.clone())),
            ("campaign_name", Value::Text(campaign.name.clone())),
            (
                "objective",
                info.objective
                    .as_deref()
                    .map_or(Value::Null, |o| Value::Text(objective_label(o))),
            ),
            ("status", text(info.status.as_ref())),
            ("account_name", Value::Text(account_name.to_string())),
            ("campaign_start", text(campaign.start_time.as_ref())),
            ("campaign_end", text(campaign.end_time.as_ref())),
            (
                "total_budget",
                campaign
                    .total_budget_amount_local_micro
                    .map_or(Value::Null, |m| Value::Float(micros(m))),
            ),
            (
                "daily_budget",
                campaign
                    .daily_budget_amount_local_micro
                    .map_or(Value::Null, |m| Value::Float(micros(m))),
            ),
            ("impressions", Value::Int(impressions)),
            ("clicks", Value::Int(metric_sum(metrics, "clicks"))),
            ("engagements", Value::Int(metric_sum(metrics, "engagements"))),
            ("spend", Value::Float(spend)),
            ("results", Value::Int(results)),
            ("result_type", Value::Text(result_label.to_string())),
            ("result_rate", Value::Float(result_rate)),
            ("result_rate_type", labelled(result_label, |l| format!("{l} rate"))),
            ("cost_per_result", Value::Float(cost_per_result)),
            ("cost_per_result_type", labelled(result_label, |l| format!("Cost per {l}"))),
        ]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(json: serde_json::Value) -> Vec<StatsEntry> {
        serde_json::from_value(json).unwrap()
    }

    fn index() -> HashMap<String, CampaignInfo> {
        let campaigns = vec![
            Campaign {
                id: "8wku2".into(),
                name: "Spring Sale".into(),
                daily_budget_amount_local_micro: Some(50_000_000),
                entity_status: Some("PAUSED".into()),
                ..Campaign::default()
            },
            Campaign {
                id: "9xkz1".into(),
                name: "Launch Video".into(),
                ..Campaign::default()
            },
        ];
        let items: Vec<LineItem> = serde_json::from_value(serde_json::json!([
            {"campaign_id": "8wku2", "objective": "WEBSITE_CLICKS", "entity_status": "ACTIVE"},
            {"campaign_id": "8wku2", "objective": "ENGAGEMENTS", "entity_status": "PAUSED"},
            {"campaign_id": "9xkz1", "objective": "VIDEO_VIEWS"}
        ]))
        .unwrap();
        campaign_index(campaigns, &items)
    }

    #[test]
    fn test_campaign_index_uses_first_line_item() {
        let index = index();
        assert_eq!(index["8wku2"].objective.as_deref(), Some("WEBSITE_CLICKS"));
        assert_eq!(index["8wku2"].status.as_deref(), Some("ACTIVE"));
        assert_eq!(index["9xkz1"].status, None);
    }

    #[test]
    fn test_objective_labels() {
        assert_eq!(objective_label("WEBSITE_CLICKS"), "Website clicks");
        assert_eq!(objective_label("APP_INSTALLS"), "APP_INSTALLS");
        assert_eq!(result_type(Some("VIDEO_VIEWS")), ("Video views", "video_total_views"));
        assert_eq!(result_type(Some("CUSTOM")), ("Tweet engagements", "engagements"));
        assert_eq!(result_type(Some("APP_INSTALLS")), ("", "url_clicks"));
        assert_eq!(result_type(None), ("", "url_clicks"));
    }

    #[test]
    fn test_rows_from_stats() {
        let entries = stats(serde_json::json!([
            {"id": "8wku2", "id_data": [{"segment": null, "metrics": {
                "impressions": [2000], "clicks": [40], "engagements": [55],
                "url_clicks": [25], "billed_charge_local_micro": [12_500_000]
            }}]},
            {"id": "9xkz1", "id_data": [{"segment": null, "metrics": {
                "impressions": null, "clicks": null, "video_total_views": null,
                "billed_charge_local_micro": null
            }}]},
            {"id": "gone", "id_data": []}
        ]));

        let mut frame = ReportFrame::new();
        let day = NaiveDate::from_ymd_opt(2022, 8, 15).unwrap();
        push_stats_rows(&mut frame, &index(), &entries, day, "Acme Ads");

        assert_eq!(frame.len(), 2);
        assert_eq!(frame.get(0, "objective"), Some(&Value::Text("Website clicks".into())));
        assert_eq!(frame.get(0, "results"), Some(&Value::Int(25)));
        assert_eq!(frame.get(0, "spend"), Some(&Value::Float(12.5)));
        assert_eq!(frame.get(0, "daily_budget"), Some(&Value::Float(50.0)));
        assert_eq!(frame.get(0, "result_type"), Some(&Value::Text("Link clicks".into())));
        assert_eq!(frame.get(0, "result_rate_type"), Some(&Value::Text("Link clicks rate".into())));
        assert_eq!(frame.get(0, "cost_per_result_type"), Some(&Value::Text("Cost per Link clicks".into())));

        let rate = frame.get(0, "result_rate").and_then(Value::as_f64).unwrap();
        assert!((rate - 1.25).abs() < 1e-6);
        let cpr = frame.get(0, "cost_per_result").and_then(Value::as_f64).unwrap();
        assert!((cpr - 0.5).abs() < 1e-6);

        // Null metric arrays count as zero.
        assert_eq!(frame.get(1, "impressions"), Some(&Value::Int(0)));
        assert_eq!(frame.get(1, "cost_per_result"), Some(&Value::Float(0.0)));
        assert_eq!(frame.get(1, "date_start"), Some(&Value::Text("2022-08-15".into())));
    }

    #[test]
    fn test_unmapped_objective_leaves_result_types_empty() {
        let campaigns = vec![Campaign {
            id: "a1".into(),
            name: "Installs".into(),
            ..Campaign::default()
        }];
        let items: Vec<LineItem> =
            serde_json::from_value(serde_json::json!([{"campaign_id": "a1", "objective": "APP_INSTALLS"}])).unwrap();
        let entries = stats(serde_json::json!([
            {"id": "a1", "id_data": [{"metrics": {"impressions": [10], "url_clicks": [2], "engagements": [9]}}]}
        ]));

        let mut frame = ReportFrame::new();
        let day = NaiveDate::from_ymd_opt(2022, 8, 15).unwrap();
        push_stats_rows(&mut frame, &campaign_index(campaigns, &items), &entries, day, "Acme Ads");

        assert_eq!(frame.get(0, "objective"), Some(&Value::Text("APP_INSTALLS".into())));
        assert_eq!(frame.get(0, "results"), Some(&Value::Int(2)));
        for column in ["result_type", "result_rate_type", "cost_per_result_type"] {
            assert_eq!(frame.get(0, column), Some(&Value::Text(String::new())), "{column}");
        }
    }
}
