//! Projection descriptions.

use serde::{Deserialize, Serialize};

/// One property to include in a projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PropertySelector {
    /// The property name; also used as the key in the projected row.
    pub name: String,
    /// When set, the property holds an embedded JSON document that is decoded
    /// into a structured value instead of being returned as text.
    #[serde(default, rename = "IsJsonString")]
    pub is_structured: bool,
}

impl PropertySelector {
    /// Selects a property as-is.
    pub fn plain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_structured: false,
        }
    }

    /// Selects a property holding an embedded JSON document.
    pub fn structured(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_structured: true,
        }
    }
}

/// An ordered list of property selectors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SelectSpec {
    /// The selected properties, in output order.
    pub properties: Vec<PropertySelector>,
}

impl SelectSpec {
    /// Creates a selection of plain properties.
    pub fn of<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            properties: names.into_iter().map(PropertySelector::plain).collect(),
        }
    }

    /// Appends a selector.
    pub fn with(mut self, selector: PropertySelector) -> Self {
        self.properties.push(selector);
        self
    }
}
