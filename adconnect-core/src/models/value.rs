//! Scalar cell values.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single report cell.
///
/// Vendor APIs return loosely typed data, so a cell is one of a handful of
/// scalar shapes. Nested JSON is flattened to its text form by
/// [`Value::from_json`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Missing value.
    #[default]
    Null,
    /// Boolean.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Text.
    Text(String),
}

impl Value {
    /// Converts a JSON value into a cell.
    ///
    /// Arrays and objects are kept as their compact JSON text.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => n.as_f64().map_or(Self::Null, Self::Float),
            },
            serde_json::Value::String(s) => Self::Text(s.clone()),
            other => Self::Text(other.to_string()),
        }
    }

    /// Parses a raw text field (e.g. from a CSV download), inferring numbers.
    ///
    /// Empty fields become [`Value::Null`]. A field only becomes a number
    /// when the number prints back as the same text, so identifiers like
    /// `00123`, IDs wider than `i64`, exponents and trailing zeros stay text.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().is_empty() {
            return Self::Null;
        }
        if !raw.bytes().any(|b| b.is_ascii_digit()) {
            return Self::Text(raw.to_string());
        }

        let number = if let Ok(i) = raw.parse::<i64>() {
            Self::Int(i)
        } else {
            match raw.parse::<f64>() {
                Ok(f) if f.is_finite() => Self::Float(f),
                _ => return Self::Text(raw.to_string()),
            }
        };
        if number.to_string() == raw {
            number
        } else {
            Self::Text(raw.to_string())
        }
    }

    /// Returns true for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the value as a float, if it is numeric or numeric text.
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::Text(s) => s.trim().parse().ok(),
            Self::Null | Self::Bool(_) => None,
        }
    }

    /// Returns the text content, if this is a text cell.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_infers_numbers() {
        assert_eq!(Value::parse("42"), Value::Int(42));
        assert_eq!(Value::parse("-3"), Value::Int(-3));
        assert_eq!(Value::parse("0.25"), Value::Float(0.25));
        assert_eq!(Value::parse(""), Value::Null);
        assert_eq!(Value::parse("2022/01/01"), Value::Text("2022/01/01".into()));
    }

    #[test]
    fn test_parse_keeps_leading_zero_ids() {
        assert_eq!(Value::parse("00123"), Value::Text("00123".into()));
        assert_eq!(Value::parse("0"), Value::Int(0));
    }

    #[test]
    fn test_parse_keeps_text_that_would_print_differently() {
        for raw in ["1E3", "3.10", "1.50", "2.0", "123456789012345678901", "-0", "+5", " 7"] {
            assert_eq!(Value::parse(raw), Value::Text(raw.into()), "{raw}");
        }
        assert_eq!(Value::parse("1.5"), Value::Float(1.5));
        assert_eq!(Value::parse("9223372036854775807"), Value::Int(i64::MAX));
    }

    #[test]
    fn test_parse_rejects_words_that_float_parse_accepts() {
        assert_eq!(Value::parse("inf"), Value::Text("inf".into()));
        assert_eq!(Value::parse("NaN"), Value::Text("NaN".into()));
    }

    #[test]
    fn test_from_json_flattens_nested() {
        let json = serde_json::json!([{"action_type": "link_click", "value": "3"}]);
        let value = Value::from_json(&json);
        assert_eq!(
            value,
            Value::Text(r#"[{"action_type":"link_click","value":"3"}]"#.into())
        );
        assert_eq!(Value::from_json(&serde_json::json!(1.5)), Value::Float(1.5));
        assert_eq!(Value::from_json(&serde_json::json!(7)), Value::Int(7));
    }

    #[test]
    fn test_as_f64() {
        assert_eq!(Value::Text(" 12.5 ".into()).as_f64(), Some(12.5));
        assert_eq!(Value::Int(3).as_f64(), Some(3.0));
        assert_eq!(Value::Null.as_f64(), None);
    }
}
