//! Typed constants and field values.
//!
//! [`Value`] is the runtime representation of every field read from an entity
//! and every literal produced by the value coercer. Comparisons are only
//! defined between values of the same variant; the compiler guarantees that a
//! literal always carries the variant of the field it is compared against.

use std::cmp::Ordering;
use std::fmt;

use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

/// A member of an enumeration, carrying both its ordinal and its symbolic name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnumValue {
    /// The underlying ordinal.
    pub ordinal: i64,
    /// The symbolic name.
    pub name: &'static str,
}

/// A typed field value or constant.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// Exact decimal value.
    Decimal(Decimal),
    /// Text value.
    Text(String),
    /// Identifier value.
    Uuid(Uuid),
    /// Binary value.
    Bytes(Vec<u8>),
    /// Point in time (UTC).
    DateTime(DateTime<Utc>),
    /// Calendar date.
    Date(NaiveDate),
    /// Enumeration member.
    Enum(EnumValue),
    /// Structured document decoded from an embedded payload.
    Json(serde_json::Value),
}

impl Value {
    /// Returns true for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the text content, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the variant name, used in error messages and logs.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::Int(_) => "Int",
            Value::Float(_) => "Float",
            Value::Decimal(_) => "Decimal",
            Value::Text(_) => "Text",
            Value::Uuid(_) => "Uuid",
            Value::Bytes(_) => "Binary",
            Value::DateTime(_) => "DateTime",
            Value::Date(_) => "Date",
            Value::Enum(_) => "Enum",
            Value::Json(_) => "Json",
        }
    }

    /// Compares two values of the same variant.
    ///
    /// Returns `None` when either side is null, when the variants differ, or
    /// when the variant has no ordering (structured documents, NaN floats).
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Decimal(a), Value::Decimal(b)) => Some(a.cmp(b)),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::Uuid(a), Value::Uuid(b)) => Some(a.cmp(b)),
            (Value::Bytes(a), Value::Bytes(b)) => Some(a.cmp(b)),
            (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
            (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
            (Value::Enum(a), Value::Enum(b)) => Some(a.ordinal.cmp(&b.ordinal)),
            _ => None,
        }
    }

    /// Total order used for sorting: nulls first, then [`Value::compare`].
    ///
    /// Values without a defined ordering compare as equal so that sorting
    /// keeps their enumeration order.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        match (self.is_null(), other.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => self.compare(other).unwrap_or(Ordering::Equal),
        }
    }

    /// Converts the value into a JSON value for transfer.
    ///
    /// Binary values become standard base64 strings, timestamps RFC 3339
    /// strings, decimals their exact string form and enums their name.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Decimal(d) => serde_json::Value::String(d.to_string()),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Uuid(u) => serde_json::Value::String(u.to_string()),
            Value::Bytes(b) => serde_json::Value::String(STANDARD.encode(b)),
            Value::DateTime(dt) => {
                serde_json::Value::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            Value::Date(d) => serde_json::Value::String(d.format("%Y-%m-%d").to_string()),
            Value::Enum(e) => serde_json::Value::String(e.name.to_string()),
            Value::Json(v) => v.clone(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Text(s) => write!(f, "\"{}\"", s),
            Value::Enum(e) => write!(f, "{}", e.name),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

/// Error returned when a [`Value`] does not hold the requested Rust type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueTypeError {
    /// The Rust-side type that was requested.
    pub expected: &'static str,
    /// The variant that was found.
    pub found: &'static str,
}

impl fmt::Display for ValueTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected {} value, found {}", self.expected, self.found)
    }
}

impl std::error::Error for ValueTypeError {}

/// Extraction of a concrete Rust type from a [`Value`].
///
/// Implemented for every type an entity field may have, and for `Option<T>`
/// where [`Value::Null`] maps to `None`. Entity setters use it to write
/// coerced constants back into their fields.
pub trait FromValue: Sized {
    /// Extracts `Self` from the value.
    fn from_value(value: Value) -> Result<Self, ValueTypeError>;
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, ValueTypeError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

macro_rules! value_conversions {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::$variant(value)
                }
            }

            impl FromValue for $ty {
                fn from_value(value: Value) -> Result<Self, ValueTypeError> {
                    match value {
                        Value::$variant(inner) => Ok(inner),
                        other => Err(ValueTypeError {
                            expected: stringify!($variant),
                            found: other.type_name(),
                        }),
                    }
                }
            }
        )*
    };
}

value_conversions! {
    bool => Bool,
    i64 => Int,
    f64 => Float,
    Decimal => Decimal,
    String => Text,
    Uuid => Uuid,
    Vec<u8> => Bytes,
    DateTime<Utc> => DateTime,
    NaiveDate => Date,
    EnumValue => Enum,
    serde_json::Value => Json,
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl FromValue for i32 {
    fn from_value(value: Value) -> Result<Self, ValueTypeError> {
        match value {
            Value::Int(i) => i32::try_from(i).map_err(|_| ValueTypeError {
                expected: "Int32",
                found: "Int",
            }),
            other => Err(ValueTypeError {
                expected: "Int32",
                found: other.type_name(),
            }),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_same_variant() {
        assert_eq!(Value::Int(5).compare(&Value::Int(10)), Some(Ordering::Less));
        assert_eq!(
            Value::from("b").compare(&Value::from("a")),
            Some(Ordering::Greater)
        );
        assert_eq!(Value::Int(5).compare(&Value::Float(5.0)), None);
        assert_eq!(Value::Null.compare(&Value::Null), None);
    }

    #[test]
    fn test_enum_compares_by_ordinal() {
        let low = Value::Enum(EnumValue { ordinal: 1, name: "Zeta" });
        let high = Value::Enum(EnumValue { ordinal: 2, name: "Alpha" });
        assert_eq!(low.compare(&high), Some(Ordering::Less));
    }

    #[test]
    fn test_sort_cmp_nulls_first() {
        assert_eq!(Value::Null.sort_cmp(&Value::Int(1)), Ordering::Less);
        assert_eq!(Value::Int(1).sort_cmp(&Value::Null), Ordering::Greater);
        assert_eq!(Value::Null.sort_cmp(&Value::Null), Ordering::Equal);
    }

    #[test]
    fn test_from_value_option() {
        let none: Option<i64> = FromValue::from_value(Value::Null).unwrap();
        assert_eq!(none, None);
        let some: Option<i64> = FromValue::from_value(Value::Int(3)).unwrap();
        assert_eq!(some, Some(3));
        let err = i64::from_value(Value::from("3")).unwrap_err();
        assert_eq!(err.found, "Text");
    }

    #[test]
    fn test_i32_range_checked() {
        assert_eq!(i32::from_value(Value::Int(30)).unwrap(), 30);
        assert!(i32::from_value(Value::Int(i64::MAX)).is_err());
    }

    #[test]
    fn test_to_json() {
        assert_eq!(Value::Bytes(vec![1, 2, 3]).to_json(), serde_json::json!("AQID"));
        assert_eq!(Value::Int(7).to_json(), serde_json::json!(7));
        assert_eq!(Value::Null.to_json(), serde_json::Value::Null);
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(Value::Date(date).to_json(), serde_json::json!("2024-02-29"));
    }
}
