//! Bulk update descriptions.

use serde::{Deserialize, Serialize};

/// Set one property to a literal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PropertyUpdate {
    /// The property to set; resolved case-insensitively.
    pub property_name: String,
    /// The new value as text, or null.
    #[serde(default)]
    pub value: Option<String>,
}

impl PropertyUpdate {
    /// Creates a property update.
    pub fn new(property_name: impl Into<String>, value: Option<&str>) -> Self {
        Self {
            property_name: property_name.into(),
            value: value.map(str::to_string),
        }
    }

    /// Creates an update setting a non-null literal.
    pub fn set(property_name: impl Into<String>, value: &str) -> Self {
        Self::new(property_name, Some(value))
    }
}

/// An ordered list of property updates applied as one chained mutation.
pub type MutationSpec = Vec<PropertyUpdate>;
