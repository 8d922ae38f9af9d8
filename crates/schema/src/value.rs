//! Scalar field values.
//!
//! Rule literals, building specification fields and baseline outputs all
//! share this closed value type. Numbers are `rust_decimal::Decimal`; JSON
//! numbers are read through their shortest decimal rendering so that
//! `0.85` in a rule file is exactly `0.85` at comparison time.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A scalar field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(Decimal),
    Text(String),
}

impl Value {
    /// Returns a human-readable type name for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::Text(_) => "text",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            Value::Number(d) => Some(*d),
            _ => None,
        }
    }

    /// Convert a JSON scalar. Arrays and objects are rejected.
    pub fn from_json(v: &serde_json::Value) -> Result<Value, String> {
        match v {
            serde_json::Value::Null => Ok(Value::Null),
            serde_json::Value::Bool(b) => Ok(Value::Bool(*b)),
            serde_json::Value::Number(n) => decimal_from_json(n).map(Value::Number),
            serde_json::Value::String(s) => Ok(Value::Text(s.clone())),
            serde_json::Value::Array(_) => Err("expected a scalar, got an array".to_string()),
            serde_json::Value::Object(_) => Err("expected a scalar, got an object".to_string()),
        }
    }

    /// Render as JSON. Integral numbers become JSON integers, the rest floats.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Number(d) => number_to_json(*d),
        }
    }
}

fn decimal_from_json(n: &serde_json::Number) -> Result<Decimal, String> {
    if let Some(i) = n.as_i64() {
        return Ok(Decimal::from(i));
    }
    if let Some(u) = n.as_u64() {
        return Ok(Decimal::from(u));
    }
    let rendered = n.to_string();
    Decimal::from_str(&rendered)
        .or_else(|_| Decimal::from_scientific(&rendered))
        .map_err(|_| format!("number {} cannot be represented as a decimal", rendered))
}

fn number_to_json(d: Decimal) -> serde_json::Value {
    if d.scale() == 0 {
        if let Some(i) = d.to_i64() {
            return serde_json::Value::from(i);
        }
    }
    d.to_string()
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(serde_json::Value::Number)
        .unwrap_or_else(|| serde_json::Value::String(d.to_string()))
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(d) => write!(f, "{}", d),
            Value::Text(s) => write!(f, "\"{}\"", s),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Number(Decimal::from(i))
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Number(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn json_float_keeps_its_decimal_rendering() {
        let v = Value::from_json(&serde_json::json!(0.85)).unwrap();
        assert_eq!(v, Value::Number(dec("0.85")));
    }

    #[test]
    fn json_integer_is_exact() {
        let v = Value::from_json(&serde_json::json!(25000)).unwrap();
        assert_eq!(v, Value::Number(Decimal::from(25000)));
        assert_eq!(v.to_json(), serde_json::json!(25000));
    }

    #[test]
    fn fractional_number_renders_as_float() {
        assert_eq!(Value::Number(dec("1.0")).to_json(), serde_json::json!(1.0));
        assert_eq!(Value::Number(dec("0.85")).to_json(), serde_json::json!(0.85));
    }

    #[test]
    fn numerically_equal_decimals_compare_equal() {
        assert_eq!(Value::Number(dec("1.0")), Value::Number(dec("1")));
    }

    #[test]
    fn containers_are_rejected() {
        assert!(Value::from_json(&serde_json::json!([1, 2])).is_err());
        assert!(Value::from_json(&serde_json::json!({"a": 1})).is_err());
    }

    #[test]
    fn type_names() {
        assert_eq!(Value::Null.type_name(), "null");
        assert_eq!(Value::from(true).type_name(), "bool");
        assert_eq!(Value::from(3i64).type_name(), "number");
        assert_eq!(Value::from("5a").type_name(), "text");
    }
}
