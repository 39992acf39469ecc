//! Query plans handed to backends.

use std::fmt;

use crate::error::{QueryError, QueryResult};
use crate::query::{GroupKey, GroupRepresentative, OrderKey, Predicate, Projection};
use crate::types::Pagination;

use super::backend::BackendCapability;

/// How the filtered entities are arranged before pagination.
pub enum PlanShape<E> {
    /// A flat sequence, optionally ordered.
    Ordered(Option<OrderKey<E>>),
    /// One representative record per distinct key.
    Grouped {
        /// Grouping key.
        key: GroupKey<E>,
        /// Picks the record returned for each group.
        representative: GroupRepresentative<E>,
    },
}

/// A compiled query ready for execution.
///
/// Backends apply the stages in this order: eager-load `includes`, `filter`,
/// `shape` (ordering or grouping), `pagination`, then `projection`. The
/// projection maps rows one to one, so skip/take counts are the same with or
/// without it. Grouped plans carry their projection inside the representative.
pub struct QueryPlan<E> {
    /// Navigations to load; every other navigation is left unloaded.
    pub includes: Vec<&'static str>,
    /// Entities to keep.
    pub filter: Option<Predicate<E>>,
    /// Ordering or grouping.
    pub shape: PlanShape<E>,
    /// Projection of each resulting entity.
    pub projection: Option<Projection<E>>,
    /// Skip/take window.
    pub pagination: Pagination,
}

impl<E> QueryPlan<E> {
    /// An unfiltered, unordered, unbounded plan.
    pub fn new() -> Self {
        Self {
            includes: Vec::new(),
            filter: None,
            shape: PlanShape::Ordered(None),
            projection: None,
            pagination: Pagination::unbounded(),
        }
    }

    /// Adds a navigation to load.
    pub fn include(mut self, navigation: &'static str) -> Self {
        self.includes.push(navigation);
        self
    }

    /// Sets the filter.
    pub fn filter(mut self, predicate: Predicate<E>) -> Self {
        self.filter = Some(predicate);
        self
    }

    /// Orders the result.
    pub fn order(mut self, order: OrderKey<E>) -> Self {
        self.shape = PlanShape::Ordered(Some(order));
        self
    }

    /// Groups the result, one representative per key.
    pub fn group(mut self, key: GroupKey<E>, representative: GroupRepresentative<E>) -> Self {
        self.shape = PlanShape::Grouped {
            key,
            representative,
        };
        self
    }

    /// Projects each resulting entity.
    ///
    /// On a grouped plan the projection applies to representatives that do
    /// not carry one of their own.
    pub fn project(mut self, projection: Projection<E>) -> Self {
        self.projection = Some(projection);
        self
    }

    /// Sets the skip/take window.
    pub fn paginate(mut self, pagination: Pagination) -> Self {
        self.pagination = pagination;
        self
    }

    /// The projection applied to each returned record.
    ///
    /// For grouped plans the representative's own projection comes first.
    pub fn effective_projection(&self) -> Option<&Projection<E>> {
        match &self.shape {
            PlanShape::Grouped { representative, .. } => representative
                .projection()
                .or(self.projection.as_ref()),
            PlanShape::Ordered(_) => self.projection.as_ref(),
        }
    }

    /// Rejects plans whose parts contradict each other.
    ///
    /// A grouped plan may be projected either by its representative or by
    /// the plan, not both.
    pub fn validate(&self) -> QueryResult<()> {
        if let PlanShape::Grouped { representative, .. } = &self.shape
            && representative.projection().is_some()
            && self.projection.is_some()
        {
            return Err(QueryError::invalid_argument(
                "grouped plan has both a representative and a plan projection",
            ));
        }
        Ok(())
    }

    /// Returns true for grouped plans.
    pub fn is_grouped(&self) -> bool {
        matches!(self.shape, PlanShape::Grouped { .. })
    }

    /// The backend capabilities this plan relies on.
    pub fn required_capabilities(&self) -> Vec<BackendCapability> {
        let mut required = Vec::new();
        if !self.includes.is_empty() {
            required.push(BackendCapability::EagerLoading);
        }
        if self.filter.is_some() {
            required.push(BackendCapability::Filtering);
        }
        match &self.shape {
            PlanShape::Ordered(Some(_)) => required.push(BackendCapability::Ordering),
            PlanShape::Ordered(None) => {}
            PlanShape::Grouped { representative, .. } => {
                required.push(BackendCapability::Grouping);
                if representative.order().is_some() {
                    required.push(BackendCapability::Ordering);
                }
            }
        }
        if self.effective_projection().is_some() {
            required.push(BackendCapability::Projection);
        }
        if !self.pagination.is_unbounded() {
            required.push(BackendCapability::Pagination);
        }
        required
    }
}

impl<E> Default for QueryPlan<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for QueryPlan<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryPlan")
            .field("includes", &self.includes)
            .field("filter", &self.filter)
            .field("grouped", &self.is_grouped())
            .field("projection", &self.projection)
            .field("pagination", &self.pagination)
            .finish()
    }
}

/// One-line summary used in debug logs.
impl<E> fmt::Display for QueryPlan<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.filter {
            Some(filter) => write!(f, "WHERE {}", filter)?,
            None => write!(f, "ALL")?,
        }
        match &self.shape {
            PlanShape::Ordered(Some(order)) => write!(f, " ORDER BY {}", order)?,
            PlanShape::Ordered(None) => {}
            PlanShape::Grouped { key, .. } => write!(f, " GROUP BY {}", key.field())?,
        }
        if let Some(projection) = self.effective_projection() {
            let keys: Vec<&str> = projection.columns().iter().map(|c| c.key.as_str()).collect();
            write!(f, " SELECT {}", keys.join(", "))?;
        }
        write!(
            f,
            " SKIP {} TAKE {}",
            self.pagination.skip, self.pagination.take
        )?;
        if !self.includes.is_empty() {
            write!(f, " INCLUDE {}", self.includes.join(", "))?;
        }
        Ok(())
    }
}
