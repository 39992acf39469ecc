//! Conversion of textual literals into typed constants.
//!
//! Every literal that reaches the compiler is text (it came off the wire).
//! [`coerce`] converts it into a [`Value`] of the exact variant the target
//! field holds, so that compiled comparisons never mix types.

use std::str::FromStr;

use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::{QueryError, QueryResult};
use crate::schema::{EnumDescriptor, FieldKind, FieldType};
use crate::types::Value;

/// Accepted layouts for timestamps without an offset; they are read as UTC.
const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
];

/// Converts `literal` into a constant of the target field type.
///
/// A `None` literal is only accepted for nullable targets. Identifiers,
/// binary payloads and enumerations never fall back to a default value: any
/// literal that does not parse yields [`QueryError::InvalidValue`].
pub fn coerce(literal: Option<&str>, target: &FieldType) -> QueryResult<Value> {
    let Some(text) = literal else {
        return if target.nullable {
            Ok(Value::Null)
        } else {
            Err(QueryError::invalid_value(
                None,
                target.to_string(),
                "null is not allowed for a non-nullable field",
            ))
        };
    };

    let fail = |message: String| QueryError::invalid_value(Some(text), target.to_string(), message);
    let trimmed = text.trim();

    match target.kind {
        FieldKind::Text => Ok(Value::Text(text.to_string())),
        FieldKind::Uuid => Uuid::parse_str(trimmed)
            .map(Value::Uuid)
            .map_err(|e| fail(e.to_string())),
        FieldKind::Binary => STANDARD
            .decode(trimmed)
            .map(Value::Bytes)
            .map_err(|e| fail(e.to_string())),
        FieldKind::Enum(descriptor) => coerce_enum(trimmed, descriptor).map_err(fail),
        FieldKind::Bool => parse_bool(trimmed)
            .map(Value::Bool)
            .ok_or_else(|| fail("expected 'true' or 'false'".to_string())),
        FieldKind::Int => trimmed
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|e| fail(e.to_string())),
        FieldKind::Float => trimmed
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|e| fail(e.to_string())),
        FieldKind::Decimal => Decimal::from_str(trimmed)
            .or_else(|_| Decimal::from_scientific(trimmed))
            .map(Value::Decimal)
            .map_err(|e| fail(e.to_string())),
        FieldKind::Date => NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .map(Value::Date)
            .map_err(|e| fail(e.to_string())),
        FieldKind::DateTime => parse_datetime(trimmed)
            .map(Value::DateTime)
            .ok_or_else(|| fail("expected an RFC 3339 timestamp or 'YYYY-MM-DD[ HH:MM:SS]'".to_string())),
    }
}

fn coerce_enum(text: &str, descriptor: &EnumDescriptor) -> Result<Value, String> {
    if let Ok(ordinal) = text.parse::<i64>() {
        return descriptor
            .by_ordinal(ordinal)
            .map(Value::Enum)
            .ok_or_else(|| format!("{ordinal} is not a declared member of {}", descriptor.name));
    }
    descriptor
        .by_name(text)
        .map(Value::Enum)
        .ok_or_else(|| format!("'{text}' is not a member of {}", descriptor.name))
}

fn parse_bool(text: &str) -> Option<bool> {
    if text.eq_ignore_ascii_case("true") {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn parse_datetime(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(dt) = NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
    {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}
