//! Filter descriptions as supplied over the wire.
//!
//! A [`FilterSpec`] is one `(property, operator, literal)` triple; a
//! [`CombinedFilter`] is a flat list of them folded with a single
//! [`Combinator`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::QueryError;

/// Comparison operators accepted in a [`FilterSpec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FilterOperator {
    /// `property == value`
    Equal,
    /// `property != value`
    NotEqual,
    /// `property > value`
    GreaterThan,
    /// `property >= value`
    GreaterThanOrEqual,
    /// `property < value`
    LessThan,
    /// `property <= value`
    LessThanOrEqual,
    /// Substring test on text properties.
    Contains,
    /// The property holds no value.
    IsNull,
    /// The property holds a value.
    IsNotNull,
}

impl FilterOperator {
    /// All operators, in their canonical order.
    pub const ALL: [FilterOperator; 9] = [
        FilterOperator::Equal,
        FilterOperator::NotEqual,
        FilterOperator::GreaterThan,
        FilterOperator::GreaterThanOrEqual,
        FilterOperator::LessThan,
        FilterOperator::LessThanOrEqual,
        FilterOperator::Contains,
        FilterOperator::IsNull,
        FilterOperator::IsNotNull,
    ];

    /// Returns the wire name of the operator.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Equal => "Equal",
            FilterOperator::NotEqual => "NotEqual",
            FilterOperator::GreaterThan => "GreaterThan",
            FilterOperator::GreaterThanOrEqual => "GreaterThanOrEqual",
            FilterOperator::LessThan => "LessThan",
            FilterOperator::LessThanOrEqual => "LessThanOrEqual",
            FilterOperator::Contains => "Contains",
            FilterOperator::IsNull => "IsNull",
            FilterOperator::IsNotNull => "IsNotNull",
        }
    }

    /// Returns true for operators that ignore the filter value.
    pub fn is_null_test(&self) -> bool {
        matches!(self, FilterOperator::IsNull | FilterOperator::IsNotNull)
    }

    /// Returns true for `<`, `<=`, `>`, `>=`.
    pub fn is_ordering(&self) -> bool {
        matches!(
            self,
            FilterOperator::GreaterThan
                | FilterOperator::GreaterThanOrEqual
                | FilterOperator::LessThan
                | FilterOperator::LessThanOrEqual
        )
    }

    /// Formats a list of operators as a comma-separated list of wire names.
    pub fn list(operators: &[FilterOperator]) -> String {
        operators
            .iter()
            .map(FilterOperator::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FilterOperator {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterOperator::ALL
            .iter()
            .copied()
            .find(|op| op.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| QueryError::UnsupportedOperator {
                operator: s.to_string(),
                property: String::new(),
                field_type: String::new(),
                allowed: FilterOperator::list(&FilterOperator::ALL),
            })
    }
}

impl TryFrom<String> for FilterOperator {
    type Error = QueryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FilterOperator> for String {
    fn from(value: FilterOperator) -> Self {
        value.as_str().to_string()
    }
}

/// A single `(property, operator, literal)` comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FilterSpec {
    /// Name of the entity property to test.
    pub property_name: String,
    /// The comparison operator.
    pub operator: FilterOperator,
    /// The literal, as text. Ignored by `IsNull`/`IsNotNull`.
    #[serde(default)]
    pub value: Option<String>,
}

impl FilterSpec {
    /// Creates a new filter.
    pub fn new(
        property_name: impl Into<String>,
        operator: FilterOperator,
        value: Option<&str>,
    ) -> Self {
        Self {
            property_name: property_name.into(),
            operator,
            value: value.map(str::to_string),
        }
    }

    /// Shorthand for an `Equal` filter.
    pub fn eq(property_name: impl Into<String>, value: &str) -> Self {
        Self::new(property_name, FilterOperator::Equal, Some(value))
    }

    /// Shorthand for an `IsNull` filter.
    pub fn is_null(property_name: impl Into<String>) -> Self {
        Self::new(property_name, FilterOperator::IsNull, None)
    }
}

/// Logical operator folding the filters of a [`CombinedFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Combinator {
    /// All filters must match.
    #[default]
    And,
    /// At least one filter must match.
    Or,
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Combinator::And => write!(f, "AND"),
            Combinator::Or => write!(f, "OR"),
        }
    }
}

/// A flat list of filters combined by one logical operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CombinedFilter {
    /// The filters, applied in order.
    pub filters: Vec<FilterSpec>,
    /// How the filters are combined.
    #[serde(default, rename = "CombineOperator")]
    pub combinator: Combinator,
}

impl CombinedFilter {
    /// Creates an AND combination.
    pub fn all(filters: Vec<FilterSpec>) -> Self {
        Self {
            filters,
            combinator: Combinator::And,
        }
    }

    /// Creates an OR combination.
    pub fn any(filters: Vec<FilterSpec>) -> Self {
        Self {
            filters,
            combinator: Combinator::Or,
        }
    }
}

impl From<FilterSpec> for CombinedFilter {
    fn from(filter: FilterSpec) -> Self {
        CombinedFilter::all(vec![filter])
    }
}
