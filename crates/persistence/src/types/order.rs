//! Ordering and grouping descriptions.

use serde::{Deserialize, Serialize};

use super::select::SelectSpec;

/// Sort on a single property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OrderSpec {
    /// The property to sort by.
    pub property_name: String,
    /// Sort from highest to lowest.
    #[serde(default)]
    pub descending: bool,
}

impl OrderSpec {
    /// Ascending order on a property.
    pub fn asc(property_name: impl Into<String>) -> Self {
        Self {
            property_name: property_name.into(),
            descending: false,
        }
    }

    /// Descending order on a property.
    pub fn desc(property_name: impl Into<String>) -> Self {
        Self {
            property_name: property_name.into(),
            descending: true,
        }
    }
}

/// Group on a single column and pick one representative record per group.
///
/// Inside each group the records are ordered by `order_by` (if present),
/// then reshaped by `selector` (if present), and the first one is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GroupSpec {
    /// The grouping column.
    #[serde(rename = "GroupByColumnName")]
    pub group_by_column: String,
    /// Ordering applied inside each group.
    #[serde(default)]
    pub order_by: Option<OrderSpec>,
    /// Projection applied to the representative.
    #[serde(default)]
    pub selector: Option<SelectSpec>,
}

impl GroupSpec {
    /// Groups on a column with no ordering and no projection.
    pub fn by(column: impl Into<String>) -> Self {
        Self {
            group_by_column: column.into(),
            order_by: None,
            selector: None,
        }
    }

    /// Sets the in-group ordering.
    pub fn ordered(mut self, order: OrderSpec) -> Self {
        self.order_by = Some(order);
        self
    }

    /// Sets the representative projection.
    pub fn selecting(mut self, selector: SelectSpec) -> Self {
        self.selector = Some(selector);
        self
    }
}
