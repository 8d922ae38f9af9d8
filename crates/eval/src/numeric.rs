//! Coercion and comparison of field values.
//!
//! The only place values of different types meet. Numbers are compared as
//! `rust_decimal::Decimal`; numeric strings are parsed after trimming.
//! Booleans never coerce to numbers.

use std::str::FromStr;

use baseline_schema::{ComparisonOp, Value};
use rust_decimal::Decimal;

/// Coerce a value to a number, if it has a numeric reading.
pub fn coerce_number(v: &Value) -> Option<Decimal> {
    match v {
        Value::Number(d) => Some(*d),
        Value::Text(s) => parse_decimal(s),
        Value::Bool(_) | Value::Null => None,
    }
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
}

/// Equality used by `equals`, `not_equals`, `in` and `not_in`.
///
/// Same-typed values compare directly. A number and a numeric string
/// compare numerically. Text comparison is exact.
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(l), Value::Bool(r)) => l == r,
        (Value::Number(l), Value::Number(r)) => l == r,
        (Value::Text(l), Value::Text(r)) => l == r,
        (Value::Number(n), Value::Text(s)) | (Value::Text(s), Value::Number(n)) => {
            parse_decimal(s) == Some(*n)
        }
        _ => false,
    }
}

/// Apply an ordering operator to two coerced numbers.
///
/// Non-ordering operators return `None`.
pub fn compare_ordered(op: ComparisonOp, left: Decimal, right: Decimal) -> Option<bool> {
    match op {
        ComparisonOp::GreaterThan => Some(left > right),
        ComparisonOp::LessThan => Some(left < right),
        ComparisonOp::GreaterThanOrEqual => Some(left >= right),
        ComparisonOp::LessThanOrEqual => Some(left <= right),
        _ => None,
    }
}
