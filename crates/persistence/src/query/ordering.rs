//! Ordering keys, grouping keys and group representatives.

use std::cmp::Ordering;
use std::fmt;
use std::marker::PhantomData;

use crate::error::QueryResult;
use crate::schema::{Entity, FieldRef};
use crate::types::{GroupSpec, OrderSpec, Value};

use super::projection::{Projection, Record};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortDirection {
    /// Smallest first; nulls first.
    #[default]
    Ascending,
    /// Largest first; nulls last.
    Descending,
}

impl SortDirection {
    /// Returns the SQL keyword.
    pub fn keyword(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        }
    }
}

/// A single-key ordering over `E`.
pub struct OrderKey<E> {
    field: FieldRef,
    direction: SortDirection,
    _entity: PhantomData<fn(&E)>,
}

impl<E> OrderKey<E> {
    /// Orders by an already resolved field.
    pub fn new(field: FieldRef, direction: SortDirection) -> Self {
        Self {
            field,
            direction,
            _entity: PhantomData,
        }
    }

    /// The sort field.
    pub fn field(&self) -> FieldRef {
        self.field
    }

    /// The sort direction.
    pub fn direction(&self) -> SortDirection {
        self.direction
    }
}

impl<E: Entity> OrderKey<E> {
    /// Compiles an ordering description.
    pub fn from_spec(spec: &OrderSpec) -> QueryResult<Self> {
        let field = E::schema().resolve(&spec.property_name)?;
        let direction = if spec.descending {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        };
        Ok(Self::new(field, direction))
    }

    /// Compares two entities under this ordering.
    pub fn compare(&self, a: &E, b: &E) -> Ordering {
        let schema = E::schema();
        let ordering = schema
            .read(a, self.field)
            .sort_cmp(&schema.read(b, self.field));
        match self.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }

    /// Sorts in place. The sort is stable: ties keep their input order.
    pub fn sort(&self, items: &mut [E]) {
        items.sort_by(|a, b| self.compare(a, b));
    }
}

impl<E> Clone for OrderKey<E> {
    fn clone(&self) -> Self {
        Self::new(self.field, self.direction)
    }
}

impl<E> fmt::Debug for OrderKey<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderKey")
            .field("field", &self.field)
            .field("direction", &self.direction)
            .finish()
    }
}

impl<E> fmt::Display for OrderKey<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.direction.keyword())
    }
}

/// A single-key grouping function over `E`.
pub struct GroupKey<E> {
    field: FieldRef,
    _entity: PhantomData<fn(&E) -> Value>,
}

/// Entities sharing one key value.
#[derive(Debug, Clone, PartialEq)]
pub struct Group<E> {
    /// The shared key value.
    pub key: Value,
    /// Members in enumeration order.
    pub items: Vec<E>,
}

impl<E> GroupKey<E> {
    /// The grouping field.
    pub fn field(&self) -> FieldRef {
        self.field
    }
}

impl<E: Entity> GroupKey<E> {
    /// Compiles a grouping key for the named property.
    pub fn from_name(property: &str) -> QueryResult<Self> {
        Ok(Self {
            field: E::schema().resolve(property)?,
            _entity: PhantomData,
        })
    }

    /// Reads the key of one entity.
    pub fn key(&self, entity: &E) -> Value {
        E::schema().read(entity, self.field)
    }

    /// Partitions `items` by key. Groups appear in the order their first
    /// member was enumerated; null keys form one group.
    ///
    /// Keys are compared linearly against the groups found so far, so the
    /// cost is O(items x groups). `Value` is not hashable (floats, JSON).
    pub fn group(&self, items: Vec<E>) -> Vec<Group<E>> {
        let mut groups: Vec<Group<E>> = Vec::new();
        for item in items {
            let key = self.key(&item);
            match groups.iter_mut().find(|g| g.key == key) {
                Some(group) => group.items.push(item),
                None => groups.push(Group {
                    key,
                    items: vec![item],
                }),
            }
        }
        groups
    }
}

impl<E> Clone for GroupKey<E> {
    fn clone(&self) -> Self {
        Self {
            field: self.field,
            _entity: PhantomData,
        }
    }
}

impl<E> fmt::Debug for GroupKey<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("GroupKey").field(&self.field).finish()
    }
}

/// Chooses the record that stands for a group.
///
/// The group is ordered (if an order is set), the first member is taken and
/// then projected (if a projection is set). Without an order, the first
/// member in backend enumeration order wins.
pub struct GroupRepresentative<E> {
    order: Option<OrderKey<E>>,
    projection: Option<Projection<E>>,
}

impl<E> GroupRepresentative<E> {
    /// The in-group ordering.
    pub fn order(&self) -> Option<&OrderKey<E>> {
        self.order.as_ref()
    }

    /// The projection applied to the representative.
    pub fn projection(&self) -> Option<&Projection<E>> {
        self.projection.as_ref()
    }
}

impl<E: Entity> GroupRepresentative<E> {
    /// Compiles the ordering and selector parts of a grouping description.
    pub fn from_spec(spec: &GroupSpec) -> QueryResult<Self> {
        let order = spec.order_by.as_ref().map(OrderKey::from_spec).transpose()?;
        let projection = spec
            .selector
            .as_ref()
            .map(Projection::from_spec)
            .transpose()?;
        Ok(Self { order, projection })
    }

    /// Selects the representative of one group.
    ///
    /// Returns `None` only for an empty group.
    pub fn select(&self, mut group: Group<E>) -> QueryResult<Option<Record<E>>> {
        if let Some(order) = &self.order {
            order.sort(&mut group.items);
        }
        let Some(first) = group.items.into_iter().next() else {
            return Ok(None);
        };
        match &self.projection {
            Some(projection) => projection.apply(&first).map(|row| Some(Record::Row(row))),
            None => Ok(Some(Record::Entity(first))),
        }
    }
}

impl<E> Clone for GroupRepresentative<E> {
    fn clone(&self) -> Self {
        Self {
            order: self.order.clone(),
            projection: self.projection.clone(),
        }
    }
}

impl<E> fmt::Debug for GroupRepresentative<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupRepresentative")
            .field("order", &self.order)
            .field("projection", &self.projection)
            .finish()
    }
}
