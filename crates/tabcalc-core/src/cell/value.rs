//! Raw cell values and sibling snapshots

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

use super::ColumnId;

/// Leading decimal number of a string (`"12.5kg"` → `12.5`)
static NUMERIC_PREFIX: OnceLock<Regex> = OnceLock::new();

fn numeric_prefix() -> &'static Regex {
    NUMERIC_PREFIX.get_or_init(|| {
        Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?")
            .expect("numeric prefix pattern is valid")
    })
}

/// The raw value stored in a cell
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    /// Empty cell
    #[default]
    Null,
    /// Numeric value
    Number(f64),
    /// Text value (may still hold a number typed by the user)
    Text(String),
}

impl RawValue {
    /// Numeric interpretation of the value
    ///
    /// Text uses its longest leading decimal prefix after trimming
    /// whitespace. Anything without a numeric reading is `0`.
    ///
    /// ```
    /// use tabcalc_core::RawValue;
    ///
    /// assert_eq!(RawValue::from("42").as_number(), 42.0);
    /// assert_eq!(RawValue::from(" 12px").as_number(), 12.0);
    /// assert_eq!(RawValue::from("n/a").as_number(), 0.0);
    /// assert_eq!(RawValue::Null.as_number(), 0.0);
    /// ```
    pub fn as_number(&self) -> f64 {
        match self {
            RawValue::Null => 0.0,
            RawValue::Number(n) if n.is_nan() => 0.0,
            RawValue::Number(n) => *n,
            RawValue::Text(s) => numeric_prefix()
                .find(s.trim_start())
                .and_then(|m| m.as_str().parse::<f64>().ok())
                .unwrap_or(0.0),
        }
    }

    /// Check if the cell is empty
    pub fn is_null(&self) -> bool {
        matches!(self, RawValue::Null)
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Null => Ok(()),
            RawValue::Number(n) => write!(f, "{}", n),
            RawValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for RawValue {
    fn from(n: f64) -> Self {
        RawValue::Number(n)
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::Text(s)
    }
}

impl From<Option<f64>> for RawValue {
    fn from(n: Option<f64>) -> Self {
        n.map(RawValue::Number).unwrap_or(RawValue::Null)
    }
}

/// Immutable view of one cell in a row, used only for reads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellSnapshot {
    pub column_id: ColumnId,
    #[serde(default)]
    pub raw_value: RawValue,
}

impl CellSnapshot {
    /// Create a new snapshot
    pub fn new(column_id: impl Into<ColumnId>, raw_value: impl Into<RawValue>) -> Self {
        Self {
            column_id: column_id.into(),
            raw_value: raw_value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_text_numeric_prefix() {
        assert_eq!(RawValue::from("3.5").as_number(), 3.5);
        assert_eq!(RawValue::from("-2e3").as_number(), -2000.0);
        assert_eq!(RawValue::from(".5").as_number(), 0.5);
        assert_eq!(RawValue::from("7 units").as_number(), 7.0);
        assert_eq!(RawValue::from("").as_number(), 0.0);
        assert_eq!(RawValue::from("abc12").as_number(), 0.0);
    }

    #[test]
    fn test_number_nan_is_zero() {
        assert_eq!(RawValue::Number(f64::NAN).as_number(), 0.0);
        assert_eq!(RawValue::Number(-4.0).as_number(), -4.0);
    }

    #[test]
    fn test_untagged_json() {
        let cells: Vec<CellSnapshot> = serde_json::from_str(
            r#"[
                {"column_id": "a", "raw_value": 10},
                {"column_id": "b", "raw_value": "20"},
                {"column_id": "c", "raw_value": null},
                {"column_id": "d"}
            ]"#,
        )
        .unwrap();

        assert_eq!(cells[0].raw_value, RawValue::Number(10.0));
        assert_eq!(cells[1].raw_value, RawValue::Text("20".into()));
        assert!(cells[2].raw_value.is_null());
        assert!(cells[3].raw_value.is_null());
    }
}
