//! Parameterised SQL text.

use chrono::SecondsFormat;

use crate::types::Value;

/// A fragment of SQL with bound parameters.
///
/// Placeholders are numbered (`?1`, `?2`, ...) in the order parameters are
/// added, so a statement is built by appending to one fragment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlFragment {
    /// The SQL text.
    pub sql: String,
    /// Bound parameter values.
    pub params: Vec<SqlParam>,
}

/// A bound SQL parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    /// Text parameter.
    String(String),
    /// Integer parameter.
    Integer(i64),
    /// Float parameter.
    Float(f64),
    /// Binary parameter.
    Blob(Vec<u8>),
    /// Null parameter.
    Null,
}

impl SqlParam {
    /// Creates a string parameter.
    pub fn string(s: impl Into<String>) -> Self {
        SqlParam::String(s.into())
    }

    /// Creates an integer parameter.
    pub fn integer(i: i64) -> Self {
        SqlParam::Integer(i)
    }
}

impl From<&Value> for SqlParam {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => SqlParam::Null,
            Value::Bool(b) => SqlParam::Integer(i64::from(*b)),
            Value::Int(i) => SqlParam::Integer(*i),
            Value::Float(f) => SqlParam::Float(*f),
            Value::Decimal(d) => SqlParam::String(d.to_string()),
            Value::Text(s) => SqlParam::String(s.clone()),
            Value::Uuid(u) => SqlParam::String(u.to_string()),
            Value::Bytes(b) => SqlParam::Blob(b.clone()),
            Value::DateTime(dt) => {
                SqlParam::String(dt.to_rfc3339_opts(SecondsFormat::Micros, true))
            }
            Value::Date(d) => SqlParam::String(d.format("%Y-%m-%d").to_string()),
            Value::Enum(e) => SqlParam::Integer(e.ordinal),
            Value::Json(v) => SqlParam::String(v.to_string()),
        }
    }
}

impl SqlFragment {
    /// Creates a new SQL fragment.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Adds a parameter and returns its placeholder.
    pub fn add_param(&mut self, param: SqlParam) -> String {
        self.params.push(param);
        format!("?{}", self.params.len())
    }

    /// Appends raw SQL text.
    pub fn push_sql(&mut self, sql: &str) {
        self.sql.push_str(sql);
    }

    /// Returns true if this fragment is empty.
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }
}

/// Quotes an identifier, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
