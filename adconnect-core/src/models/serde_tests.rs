//! Serde tests for core types.
//!
//! Frames and account types are written to JSON by the CLI and persisted in
//! settings, so their wire shapes are pinned here.

use serde_json::json;

use crate::{AccountId, ConnectionInfo, DateRange, Platform, ReportFrame, SubAccount, Value};

// ============================================================================
// Platform Serde Tests
// ============================================================================

#[test]
fn test_platform_serde_snake_case() {
    let test_cases = vec![
        (r#""facebook""#, Platform::Facebook),
        (r#""trade_desk""#, Platform::TradeDesk),
        (r#""linked_in""#, Platform::LinkedIn),
        (r#""dv360""#, Platform::Dv360),
        (r#""campaign_manager""#, Platform::CampaignManager),
        (r#""google_trends""#, Platform::GoogleTrends),
    ];

    for (json, expected) in test_cases {
        let result: Platform = serde_json::from_str(json).unwrap();
        assert_eq!(result, expected, "Failed for {}", json);
    }
}

#[test]
fn test_platform_invalid_deserialize() {
    let result: Result<Platform, _> = serde_json::from_str(r#""myspace""#);
    assert!(result.is_err());
}

// ============================================================================
// Account Serde Tests
// ============================================================================

#[test]
fn test_account_id_is_transparent() {
    let id = AccountId::new("act_123");
    assert_eq!(serde_json::to_value(&id).unwrap(), json!("act_123"));
}

#[test]
fn test_sub_account_omits_missing_currency() {
    let account = SubAccount::new("act_1", "Main");
    let value = serde_json::to_value(&account).unwrap();
    assert_eq!(value, json!({"id": "act_1", "name": "Main"}));

    let with_currency: SubAccount =
        serde_json::from_value(json!({"id": "9", "name": "EU", "currency": "EUR"})).unwrap();
    assert_eq!(with_currency.currency.as_deref(), Some("EUR"));
}

#[test]
fn test_connection_info_shape() {
    let info = ConnectionInfo::new(Platform::Facebook, "ads@example.com")
        .with_login_account_id("42")
        .with_sub_accounts(3);
    let value = serde_json::to_value(&info).unwrap();
    assert_eq!(
        value,
        json!({
            "platform": "facebook",
            "login_account": "ads@example.com",
            "login_account_id": "42",
            "num_sub_account": 3
        })
    );
}

// ============================================================================
// Frame Serde Tests
// ============================================================================

#[test]
fn test_value_untagged() {
    let values = vec![
        Value::Null,
        Value::Bool(true),
        Value::Int(3),
        Value::Float(0.5),
        Value::from("x"),
    ];
    assert_eq!(
        serde_json::to_value(&values).unwrap(),
        json!([null, true, 3, 0.5, "x"])
    );
}

#[test]
fn test_date_range_serde() {
    let range = DateRange::parse("2022-01-01", "2022-01-31").unwrap();
    let value = serde_json::to_value(range).unwrap();
    assert_eq!(value, json!({"start": "2022-01-01", "end": "2022-01-31"}));
}
