//! Pagination types for query results.
//!
//! Pagination is offset-based: `skip` rows are dropped from the ordered result
//! and at most `take` rows are returned. A `take` of zero means unbounded.

use serde::{Deserialize, Serialize};

/// Pagination configuration for a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Pagination {
    /// Number of leading rows to drop.
    #[serde(default)]
    pub skip: u32,

    /// Maximum number of rows to return; `0` means unbounded.
    #[serde(default)]
    pub take: u32,
}

impl Pagination {
    /// Creates pagination with the given skip and take.
    pub fn new(skip: u32, take: u32) -> Self {
        Self { skip, take }
    }

    /// Pagination returning every row.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Returns the row limit, or `None` when unbounded.
    pub fn limit(&self) -> Option<usize> {
        if self.take == 0 {
            None
        } else {
            Some(self.take as usize)
        }
    }

    /// Returns true if this pagination keeps every row.
    pub fn is_unbounded(&self) -> bool {
        self.skip == 0 && self.take == 0
    }

    /// Applies the window to an already ordered sequence.
    pub fn apply<T, I>(&self, rows: I) -> Vec<T>
    where
        I: IntoIterator<Item = T>,
    {
        let rows = rows.into_iter().skip(self.skip as usize);
        match self.limit() {
            Some(limit) => rows.take(limit).collect(),
            None => rows.collect(),
        }
    }

    /// Caps `take` at `max`, turning an unbounded take into `max`.
    pub fn capped(self, max: Option<u32>) -> Self {
        match max {
            Some(max) if self.take == 0 || self.take > max => Self {
                skip: self.skip,
                take: max,
            },
            _ => self,
        }
    }
}
