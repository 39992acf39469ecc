//! Request models as deserialised from inbound payloads.
//!
//! These are the uncompiled shapes; the repository compiles them into
//! [`ItemsQuery`](crate::repository::ItemsQuery) and friends before any backend
//! call is made.

use serde::{Deserialize, Serialize};

use super::filter::{CombinedFilter, FilterSpec};
use super::order::{GroupSpec, OrderSpec};
use super::select::SelectSpec;
use super::update::PropertyUpdate;

fn default_take() -> u32 {
    10
}

/// Filtered, ordered, paginated listing request.
///
/// When both `filter` and `combined_filters` are present the combined list
/// wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetItemsRequest {
    /// Optional projection.
    #[serde(default)]
    pub selector: Option<SelectSpec>,
    /// Single filter.
    #[serde(default)]
    pub filter: Option<FilterSpec>,
    /// Combined filter list.
    #[serde(default)]
    pub combined_filters: Option<CombinedFilter>,
    /// Optional ordering.
    #[serde(default, alias = "OrderdBy")]
    pub ordered_by: Option<OrderSpec>,
    /// Rows to skip.
    #[serde(default)]
    pub skip: u32,
    /// Rows to take; `0` means unbounded.
    #[serde(default = "default_take")]
    pub take: u32,
    /// Eager-load hints.
    #[serde(default)]
    pub includes: Option<Vec<String>>,
}

impl Default for GetItemsRequest {
    fn default() -> Self {
        Self {
            selector: None,
            filter: None,
            combined_filters: None,
            ordered_by: None,
            skip: 0,
            take: default_take(),
            includes: None,
        }
    }
}

/// Single-entity projection request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetSelectRequest {
    /// Optional projection.
    #[serde(default)]
    pub selector: Option<SelectSpec>,
    /// Eager-load hints.
    #[serde(default)]
    pub includes: Option<Vec<String>>,
}

/// Distinct-by-column request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GroupByRequest {
    /// Grouping description.
    pub group_by: GroupSpec,
    /// Filter applied before grouping.
    #[serde(default)]
    pub filters: Option<CombinedFilter>,
    /// Groups to skip.
    #[serde(default)]
    pub skip: u32,
    /// Groups to take; `0` means unbounded.
    #[serde(default = "default_take")]
    pub take: u32,
}

impl GroupByRequest {
    /// Creates a request for the first page of groups.
    pub fn new(group_by: GroupSpec) -> Self {
        Self {
            group_by,
            filters: None,
            skip: 0,
            take: default_take(),
        }
    }
}

/// Bulk in-place update request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateWhereRequest {
    /// Rows to update; `None` updates every row.
    #[serde(default)]
    pub filters: Option<CombinedFilter>,
    /// Property assignments, applied in order.
    pub update_properties: Vec<PropertyUpdate>,
}
