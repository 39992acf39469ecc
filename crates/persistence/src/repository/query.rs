//! Compiled, service-level query values.
//!
//! Request models are compiled here in full before a backend session is
//! acquired, so malformed requests never reach a backend.

use std::fmt;

use crate::config::RepositoryConfig;
use crate::core::QueryPlan;
use crate::error::QueryResult;
use crate::query::{
    GroupKey, GroupRepresentative, Mutation, OrderKey, Predicate, Projection, SortDirection,
};
use crate::schema::Entity;
use crate::types::{
    CombinedFilter, GetItemsRequest, GetSelectRequest, GroupByRequest, Pagination,
    UpdateWhereRequest,
};

/// Resolves eager-load hints against the entity's declared navigations.
///
/// Names match case-insensitively and are returned in their declared
/// spelling, without duplicates.
pub fn resolve_includes<E: Entity>(names: &[String]) -> QueryResult<Vec<&'static str>> {
    let schema = E::schema();
    let mut resolved: Vec<&'static str> = Vec::with_capacity(names.len());
    for name in names {
        let navigation = schema.navigation(name)?.name();
        if !resolved.contains(&navigation) {
            resolved.push(navigation);
        }
    }
    Ok(resolved)
}

fn compile_filter<E: Entity>(filter: Option<&CombinedFilter>) -> QueryResult<Option<Predicate<E>>> {
    filter.map(Predicate::combine).transpose()
}

/// A compiled listing query: filter, ordering, projection and page.
pub struct ItemsQuery<E> {
    includes: Vec<&'static str>,
    filter: Option<Predicate<E>>,
    order: Option<OrderKey<E>>,
    projection: Option<Projection<E>>,
    pagination: Pagination,
}

impl<E: Entity> ItemsQuery<E> {
    /// An unfiltered query for the first `take` entities.
    pub fn new(take: u32) -> Self {
        Self {
            includes: Vec::new(),
            filter: None,
            order: None,
            projection: None,
            pagination: Pagination::new(0, take),
        }
    }

    /// Compiles a listing request.
    ///
    /// `CombinedFilters` takes precedence over `Filter` when both are given.
    pub fn compile(request: &GetItemsRequest) -> QueryResult<Self> {
        let filter = match (&request.combined_filters, &request.filter) {
            (Some(combined), _) => Some(Predicate::combine(combined)?),
            (None, Some(single)) => Some(Predicate::from_filter(single)?),
            (None, None) => None,
        };
        Ok(Self {
            includes: resolve_includes::<E>(request.includes.as_deref().unwrap_or_default())?,
            filter,
            order: request.ordered_by.as_ref().map(OrderKey::from_spec).transpose()?,
            projection: request.selector.as_ref().map(Projection::from_spec).transpose()?,
            pagination: Pagination::new(request.skip, request.take),
        })
    }

    /// Loads the named navigation.
    pub fn include(mut self, navigation: &str) -> QueryResult<Self> {
        let name = E::schema().navigation(navigation)?.name();
        if !self.includes.contains(&name) {
            self.includes.push(name);
        }
        Ok(self)
    }

    /// Keeps only entities matching `predicate`.
    pub fn filter(mut self, predicate: Predicate<E>) -> Self {
        self.filter = Some(predicate);
        self
    }

    /// Orders by `order` instead of the default ordering.
    pub fn order(mut self, order: OrderKey<E>) -> Self {
        self.order = Some(order);
        self
    }

    /// Projects each entity into a row.
    pub fn select(mut self, projection: Projection<E>) -> Self {
        self.projection = Some(projection);
        self
    }

    /// Sets the page window.
    pub fn page(mut self, skip: u32, take: u32) -> Self {
        self.pagination = Pagination::new(skip, take);
        self
    }

    /// The requested page window, before any configured cap.
    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    /// Builds the plan, applying the configured default ordering and page cap.
    ///
    /// Without an explicit ordering the result is sorted newest first by the
    /// entity's modification timestamp, when it declares one.
    pub fn into_plan(self, config: &RepositoryConfig) -> QueryPlan<E> {
        let order = self.order.or_else(|| {
            if !config.apply_default_order {
                return None;
            }
            E::schema()
                .modified_at()
                .map(|field| OrderKey::new(field, SortDirection::Descending))
        });

        let mut plan = QueryPlan::new().paginate(
            config.pagination(self.pagination.skip, self.pagination.take),
        );
        plan.includes = self.includes;
        plan.filter = self.filter;
        plan.projection = self.projection;
        match order {
            Some(order) => plan.order(order),
            None => plan,
        }
    }
}

impl<E> fmt::Debug for ItemsQuery<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemsQuery")
            .field("includes", &self.includes)
            .field("filter", &self.filter)
            .field("order", &self.order.as_ref().map(ToString::to_string))
            .field("projection", &self.projection)
            .field("pagination", &self.pagination)
            .finish()
    }
}

/// A compiled distinct-by-key query.
pub struct GroupQuery<E> {
    filter: Option<Predicate<E>>,
    key: GroupKey<E>,
    representative: GroupRepresentative<E>,
    pagination: Pagination,
}

impl<E: Entity> GroupQuery<E> {
    /// Compiles a group-by request.
    pub fn compile(request: &GroupByRequest) -> QueryResult<Self> {
        Ok(Self {
            filter: compile_filter(request.filters.as_ref())?,
            key: GroupKey::from_name(&request.group_by.group_by_column)?,
            representative: GroupRepresentative::from_spec(&request.group_by)?,
            pagination: Pagination::new(request.skip, request.take),
        })
    }

    /// Builds the plan, applying the configured page cap. Groups are never
    /// given a default ordering.
    pub fn into_plan(self, config: &RepositoryConfig) -> QueryPlan<E> {
        let mut plan = QueryPlan::new()
            .group(self.key, self.representative)
            .paginate(config.pagination(self.pagination.skip, self.pagination.take));
        plan.filter = self.filter;
        plan
    }
}

impl<E> fmt::Debug for GroupQuery<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupQuery")
            .field("filter", &self.filter)
            .field("key", &self.key.field())
            .field("pagination", &self.pagination)
            .finish_non_exhaustive()
    }
}

/// A compiled single-entity projection.
pub struct SelectQuery<E> {
    includes: Vec<&'static str>,
    projection: Option<Projection<E>>,
}

impl<E: Entity> SelectQuery<E> {
    /// Compiles a select request.
    pub fn compile(request: &GetSelectRequest) -> QueryResult<Self> {
        Ok(Self {
            includes: resolve_includes::<E>(request.includes.as_deref().unwrap_or_default())?,
            projection: request.selector.as_ref().map(Projection::from_spec).transpose()?,
        })
    }

    /// Builds the plan for the entity matching `filter`.
    pub fn into_plan(self, filter: Predicate<E>) -> QueryPlan<E> {
        let mut plan = QueryPlan::new().filter(filter);
        plan.includes = self.includes;
        plan.projection = self.projection;
        plan
    }
}

/// A compiled bulk in-place update.
pub struct UpdateWhere<E> {
    /// Rows to update; `None` updates every row.
    pub filter: Option<Predicate<E>>,
    /// Assignments applied to each matching row.
    pub mutation: Mutation<E>,
}

impl<E: Entity> UpdateWhere<E> {
    /// Creates an update from compiled parts.
    pub fn new(filter: Option<Predicate<E>>, mutation: Mutation<E>) -> Self {
        Self { filter, mutation }
    }

    /// Compiles an update request.
    ///
    /// A present but empty filter list is rejected rather than treated as
    /// "every row".
    pub fn compile(request: &UpdateWhereRequest) -> QueryResult<Self> {
        Ok(Self {
            filter: compile_filter(request.filters.as_ref())?,
            mutation: Mutation::from_updates(&request.update_properties)?,
        })
    }
}

impl<E> fmt::Debug for UpdateWhere<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateWhere")
            .field("filter", &self.filter)
            .field("mutation", &self.mutation)
            .finish()
    }
}

impl<E> fmt::Display for UpdateWhere<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mutation)?;
        if let Some(filter) = &self.filter {
            write!(f, " WHERE {}", filter)?;
        }
        Ok(())
    }
}
