//! Chained set-property mutations for bulk in-place updates.

use std::fmt;
use std::marker::PhantomData;

use crate::error::{QueryError, QueryResult};
use crate::schema::{Entity, FieldRef};
use crate::types::{PropertyUpdate, Value};

use super::coerce::coerce;

/// One `field = value` assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct SetProperty {
    /// The target field.
    pub field: FieldRef,
    /// The coerced value.
    pub value: Value,
}

/// An ordered chain of assignments applied to every matching entity.
///
/// Each property may be assigned at most once per mutation; fields declared
/// read-only cannot be assigned at all.
pub struct Mutation<E> {
    assignments: Vec<SetProperty>,
    _entity: PhantomData<fn(&mut E)>,
}

impl<E> Mutation<E> {
    /// The assignments in caller order.
    pub fn assignments(&self) -> &[SetProperty] {
        &self.assignments
    }

    /// Returns true if the mutation assigns nothing.
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

impl<E: Entity> Mutation<E> {
    /// Starts an empty chain.
    pub fn new() -> Self {
        Self {
            assignments: Vec::new(),
            _entity: PhantomData,
        }
    }

    /// Appends `property = literal`, coercing the literal to the field type.
    pub fn set_property(mut self, property: &str, literal: Option<&str>) -> QueryResult<Self> {
        let schema = E::schema();
        let field = schema.resolve(property)?;
        let descriptor = schema.field(field);

        if !descriptor.is_writable() {
            return Err(QueryError::invalid_argument(format!(
                "property '{}' of entity '{}' is read-only",
                field.name(),
                schema.name()
            )));
        }
        if self.assignments.iter().any(|a| a.field == field) {
            return Err(QueryError::invalid_argument(format!(
                "property '{}' is assigned more than once",
                field.name()
            )));
        }

        let value = coerce(literal, &descriptor.field_type())?;
        self.assignments.push(SetProperty { field, value });
        Ok(self)
    }

    /// Compiles an update list, preserving its order.
    ///
    /// An empty list is rejected.
    pub fn from_updates(updates: &[PropertyUpdate]) -> QueryResult<Self> {
        if updates.is_empty() {
            return Err(QueryError::invalid_argument(
                "an update requires at least one property",
            ));
        }
        updates.iter().try_fold(Self::new(), |mutation, update| {
            mutation.set_property(&update.property_name, update.value.as_deref())
        })
    }

    /// Applies every assignment in order. Fields not named are untouched.
    pub fn apply(&self, entity: &mut E) -> QueryResult<()> {
        let schema = E::schema();
        for assignment in &self.assignments {
            let descriptor = schema.field(assignment.field);
            descriptor
                .write(entity, assignment.value.clone())
                .map_err(|e| {
                    QueryError::invalid_value(
                        None,
                        descriptor.field_type().to_string(),
                        e.to_string(),
                    )
                })?;
        }
        Ok(())
    }
}

impl<E: Entity> Default for Mutation<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for Mutation<E> {
    fn clone(&self) -> Self {
        Self {
            assignments: self.assignments.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E> fmt::Debug for Mutation<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Mutation").field(&self.assignments).finish()
    }
}

impl<E> fmt::Display for Mutation<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .assignments
            .iter()
            .map(|a| format!("{} = {}", a.field, a.value))
            .collect();
        write!(f, "SET {}", parts.join(", "))
    }
}
