//! Value type definitions for the tabula store.
//!
//! This module defines the `Value` enum, the scalar stored in every cell and
//! in every top-level value slot.

use crate::types::ValueType;
use alloc::string::String;
use core::cmp::Ordering;
use core::fmt;
use serde::{Serialize, Serializer};
use serde_json::Value as JsonValue;

/// Largest magnitude at which every integer is exactly representable as f64.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// A scalar that can be stored in a cell or a value slot.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Boolean value
    Boolean(bool),
    /// Number value. Only finite numbers are accepted by the store.
    Number(f64),
    /// UTF-8 string
    String(String),
}

impl Value {
    /// Returns the type of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Boolean(_) => ValueType::Boolean,
            Value::Number(_) => ValueType::Number,
            Value::String(_) => ValueType::String,
        }
    }

    /// Returns true if the store can hold this value: non-finite numbers are
    /// rejected even when no schema is set.
    #[inline]
    pub fn is_valid(&self) -> bool {
        match self {
            Value::Number(n) => n.is_finite(),
            _ => true,
        }
    }

    /// Returns the boolean value if this is a Boolean, None otherwise.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the number if this is a Number, None otherwise.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns a reference to the string if this is a String, None otherwise.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Converts a JSON scalar into a value.
    ///
    /// Returns `None` for null, arrays, objects and numbers that do not fit a
    /// finite f64; callers record those as invalid writes.
    pub fn from_json(json: &JsonValue) -> Option<Self> {
        match json {
            JsonValue::Bool(b) => Some(Value::Boolean(*b)),
            JsonValue::Number(n) => n.as_f64().filter(|n| n.is_finite()).map(Value::Number),
            JsonValue::String(s) => Some(Value::String(s.clone())),
            _ => None,
        }
    }

    /// Converts this value into a JSON scalar.
    ///
    /// Non-finite numbers have no JSON form and become `null`.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Boolean(b) => JsonValue::Bool(*b),
            Value::Number(n) => match integral(*n) {
                Some(i) => JsonValue::from(i),
                None => serde_json::Number::from_f64(*n)
                    .map(JsonValue::Number)
                    .unwrap_or(JsonValue::Null),
            },
            Value::String(s) => JsonValue::String(s.clone()),
        }
    }

    /// Total order used when sorting rows by a cell.
    ///
    /// Values of the same type compare naturally (false < true, numbers
    /// numerically, strings by code point). Values of different types order by
    /// type: booleans, then numbers, then strings.
    pub fn sort_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::Number(a), Value::Number(b)) => a.total_cmp(b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (a, b) => a.value_type().sort_rank().cmp(&b.value_type().sort_rank()),
        }
    }
}

/// Returns the integer form of `n` if it is integral and exactly representable.
fn integral(n: f64) -> Option<i64> {
    if n.is_finite() && n == (n as i64) as f64 && n.abs() <= MAX_SAFE_INTEGER {
        Some(n as i64)
    } else {
        None
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
        match self {
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Number(n) => match integral(*n) {
                Some(i) => serializer.serialize_i64(i),
                None => serializer.serialize_f64(*n),
            },
            Value::String(s) => serializer.serialize_str(s),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => match integral(*n) {
                Some(i) => write!(f, "{}", i),
                None => write!(f, "{}", n),
            },
            Value::String(s) => f.write_str(s),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Number(v as f64)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Number(v as f64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Number(v as f64)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Number(v as f64)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.into())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::String(v.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;
    use alloc::vec;
    use alloc::vec::Vec;

    #[test]
    fn test_value_type() {
        assert_eq!(Value::from(true).value_type(), ValueType::Boolean);
        assert_eq!(Value::from(3).value_type(), ValueType::Number);
        assert_eq!(Value::from("dog").value_type(), ValueType::String);
    }

    #[test]
    fn test_value_is_valid() {
        assert!(Value::Number(1.5).is_valid());
        assert!(!Value::Number(f64::NAN).is_valid());
        assert!(!Value::Number(f64::INFINITY).is_valid());
        assert!(Value::from("").is_valid());
    }

    #[test]
    fn test_from_json_scalars() {
        assert_eq!(Value::from_json(&JsonValue::Bool(true)), Some(Value::Boolean(true)));
        assert_eq!(Value::from_json(&JsonValue::from(3)), Some(Value::Number(3.0)));
        assert_eq!(Value::from_json(&JsonValue::from("a")), Some(Value::from("a")));
    }

    #[test]
    fn test_from_json_rejects_non_scalars() {
        assert_eq!(Value::from_json(&JsonValue::Null), None);
        assert_eq!(Value::from_json(&serde_json::json!([1, 2])), None);
        assert_eq!(Value::from_json(&serde_json::json!({"a": 1})), None);
    }

    #[test]
    fn test_to_json_integral_numbers() {
        assert_eq!(Value::Number(3.0).to_json().to_string(), "3");
        assert_eq!(Value::Number(-2.5).to_json().to_string(), "-2.5");
        assert_eq!(Value::Number(f64::NAN).to_json(), JsonValue::Null);
    }

    #[test]
    fn test_serialize() {
        let json = serde_json::to_string(&vec![
            Value::from(true),
            Value::from(3),
            Value::from(0.5),
            Value::from("x"),
        ])
        .unwrap();
        assert_eq!(json, r#"[true,3,0.5,"x"]"#);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::from(4).to_string(), "4");
        assert_eq!(Value::from(4.25).to_string(), "4.25");
        assert_eq!(Value::from("cat").to_string(), "cat");
    }

    #[test]
    fn test_sort_cmp_same_type() {
        assert_eq!(Value::from(1).sort_cmp(&Value::from(2)), Ordering::Less);
        assert_eq!(Value::from(10).sort_cmp(&Value::from(9)), Ordering::Greater);
        assert_eq!(Value::from("a").sort_cmp(&Value::from("b")), Ordering::Less);
        assert_eq!(Value::from(false).sort_cmp(&Value::from(true)), Ordering::Less);
        assert_eq!(Value::from("a").sort_cmp(&Value::from("a")), Ordering::Equal);
    }

    #[test]
    fn test_sort_cmp_cross_type() {
        let mut values: Vec<Value> = vec![
            Value::from("1"),
            Value::from(1),
            Value::from(true),
            Value::from(-5),
            Value::from(false),
        ];
        values.sort_by(|a, b| a.sort_cmp(b));
        assert_eq!(
            values,
            vec![
                Value::from(false),
                Value::from(true),
                Value::from(-5),
                Value::from(1),
                Value::from("1"),
            ]
        );
    }
}
