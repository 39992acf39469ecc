//! Plan execution over an in-process collection.
//!
//! Everything here runs synchronously under the store lock. Cancellation is
//! checked every [`CHECK_INTERVAL`] rows.

use crate::core::{CancellationHandle, PlanShape, QueryPlan};
use crate::error::{BackendError, StorageResult};
use crate::query::{Mutation, Predicate, Record};
use crate::schema::{Entity, EntitySchema};
use crate::types::Value;

use super::BACKEND_NAME;

/// Rows processed between two cancellation checks.
pub(super) const CHECK_INTERVAL: usize = 256;

/// Constraint name reported for duplicate identifiers.
pub(super) const PRIMARY_KEY: &str = "PRIMARY";

fn interrupted() -> BackendError {
    BackendError::Interrupted {
        backend_name: BACKEND_NAME.to_string(),
    }
}

fn checkpoint(index: usize, cancel: Option<&CancellationHandle>) -> Result<(), BackendError> {
    if index % CHECK_INTERVAL == 0 && cancel.is_some_and(CancellationHandle::is_cancelled) {
        return Err(interrupted());
    }
    Ok(())
}

/// Returns the positions of the rows matching `filter`, in store order.
pub(super) fn matching<E: Entity>(
    rows: &[E],
    filter: Option<&Predicate<E>>,
    cancel: Option<&CancellationHandle>,
) -> Result<Vec<usize>, BackendError> {
    let mut out = Vec::new();
    for (index, row) in rows.iter().enumerate() {
        checkpoint(index, cancel)?;
        if filter.is_none_or(|p| p.evaluate(row)) {
            out.push(index);
        }
    }
    Ok(out)
}

/// Executes a query plan: includes, filter, shape, pagination, projection.
pub(super) fn execute<E: Entity>(
    rows: &[E],
    plan: &QueryPlan<E>,
    cancel: Option<&CancellationHandle>,
) -> StorageResult<Vec<Record<E>>> {
    plan.validate()?;
    let schema = E::schema();
    let mut items: Vec<E> = matching(rows, plan.filter.as_ref(), cancel)?
        .into_iter()
        .map(|index| rows[index].clone())
        .collect();
    for item in &mut items {
        unload_excluded(schema, &plan.includes, item);
    }

    match &plan.shape {
        PlanShape::Ordered(order) => {
            if let Some(order) = order {
                order.sort(&mut items);
            }
            let page = plan.pagination.apply(items);
            let mut records = Vec::with_capacity(page.len());
            for (index, entity) in page.into_iter().enumerate() {
                checkpoint(index, cancel)?;
                let record = match &plan.projection {
                    Some(projection) => Record::Row(projection.apply(&entity)?),
                    None => Record::Entity(entity),
                };
                records.push(record);
            }
            Ok(records)
        }
        PlanShape::Grouped {
            key,
            representative,
        } => {
            let groups = plan.pagination.apply(key.group(items));
            let mut records = Vec::with_capacity(groups.len());
            for (index, group) in groups.into_iter().enumerate() {
                checkpoint(index, cancel)?;
                let record = match (representative.select(group)?, &plan.projection) {
                    (Some(Record::Entity(entity)), Some(projection)) => {
                        Record::Row(projection.apply(&entity)?)
                    }
                    (Some(record), _) => record,
                    (None, _) => continue,
                };
                records.push(record);
            }
            Ok(records)
        }
    }
}

fn unload_excluded<E>(schema: &EntitySchema<E>, includes: &[&'static str], entity: &mut E) {
    for navigation in schema.navigations() {
        if !includes.contains(&navigation.name()) {
            navigation.unload(entity);
        }
    }
}

/// Applies `mutation` to the selected rows, all or nothing.
///
/// Uniqueness is checked after every row has been rewritten; on a violation
/// the previous rows are restored.
pub(super) fn update_rows<E: Entity>(
    rows: &mut [E],
    selected: &[usize],
    mutation: &Mutation<E>,
) -> StorageResult<u64> {
    let mut updated = Vec::with_capacity(selected.len());
    for &index in selected {
        let mut row = rows[index].clone();
        mutation.apply(&mut row)?;
        updated.push(row);
    }

    let previous: Vec<E> = selected
        .iter()
        .zip(updated)
        .map(|(&index, row)| std::mem::replace(&mut rows[index], row))
        .collect();

    if let Err(err) = check_unique(rows, selected) {
        for (&index, row) in selected.iter().zip(previous) {
            rows[index] = row;
        }
        return Err(err.into());
    }
    Ok(selected.len() as u64)
}

/// Checks the identifier and every declared uniqueness constraint for the
/// rows at `changed` against all other rows.
///
/// A constraint key containing a null never collides.
pub(super) fn check_unique<E: Entity>(rows: &[E], changed: &[usize]) -> Result<(), BackendError> {
    let schema = E::schema();
    for &index in changed {
        let row = &rows[index];
        let others = rows.iter().enumerate().filter(|(i, _)| *i != index);

        for (_, other) in others.clone() {
            if other.id() == row.id() {
                return Err(violation(schema, PRIMARY_KEY));
            }
        }

        for constraint in schema.unique_constraints() {
            let Some(key) = constraint_key(schema, constraint.fields(), row) else {
                continue;
            };
            let collides = others
                .clone()
                .any(|(_, other)| constraint_key(schema, constraint.fields(), other).as_ref() == Some(&key));
            if collides {
                return Err(violation(schema, constraint.name()));
            }
        }
    }
    Ok(())
}

fn constraint_key<E>(
    schema: &EntitySchema<E>,
    fields: &[crate::schema::FieldRef],
    row: &E,
) -> Option<Vec<Value>> {
    fields
        .iter()
        .map(|field| {
            let value = schema.read(row, *field);
            (!value.is_null()).then_some(value)
        })
        .collect()
}

fn violation<E>(schema: &EntitySchema<E>, constraint: &str) -> BackendError {
    BackendError::UniqueViolation {
        backend_name: BACKEND_NAME.to_string(),
        entity: schema.name().to_string(),
        constraint: constraint.to_string(),
    }
}
