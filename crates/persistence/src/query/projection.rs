//! Projections from entities to name-keyed rows.

use std::fmt;
use std::marker::PhantomData;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::{QueryError, QueryResult};
use crate::schema::{Entity, FieldKind, FieldRef};
use crate::types::{SelectSpec, Value};

/// An insertion-ordered mapping from property name to value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    /// Creates an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a column.
    pub fn push(&mut self, name: impl Into<String>, value: Value) {
        self.columns.push((name.into(), value));
    }

    /// Looks up a column by its exact name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Iterates over the columns in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The column names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(k, _)| k.as_str())
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (key, value) in &self.columns {
            map.serialize_entry(key, &value.to_json())?;
        }
        map.end()
    }
}

/// A materialised query result: the entity itself, or a projected row.
#[derive(Debug, Clone, PartialEq)]
pub enum Record<E> {
    /// The full entity.
    Entity(E),
    /// A projected row.
    Row(Row),
}

impl<E> Record<E> {
    /// Returns the entity, if this record was not projected.
    pub fn as_entity(&self) -> Option<&E> {
        match self {
            Record::Entity(e) => Some(e),
            Record::Row(_) => None,
        }
    }

    /// Returns the row, if this record was projected.
    pub fn as_row(&self) -> Option<&Row> {
        match self {
            Record::Row(r) => Some(r),
            Record::Entity(_) => None,
        }
    }

    /// Consumes the record, returning the entity if it was not projected.
    pub fn into_entity(self) -> Option<E> {
        match self {
            Record::Entity(e) => Some(e),
            Record::Row(_) => None,
        }
    }

    /// Consumes the record, returning the row if it was projected.
    pub fn into_row(self) -> Option<Row> {
        match self {
            Record::Row(r) => Some(r),
            Record::Entity(_) => None,
        }
    }
}

/// One selected column of a [`Projection`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectedColumn {
    /// The key written into the row, as the caller spelled it.
    pub key: String,
    /// The source field.
    pub field: FieldRef,
    /// Whether the field's text is decoded as a JSON document.
    pub structured: bool,
}

/// A compiled projection from `E` to [`Row`].
pub struct Projection<E> {
    columns: Vec<ProjectedColumn>,
    _entity: PhantomData<fn(&E) -> Row>,
}

impl<E> Projection<E> {
    /// The selected columns in output order.
    pub fn columns(&self) -> &[ProjectedColumn] {
        &self.columns
    }
}

impl<E: Entity> Projection<E> {
    /// Compiles a selector list.
    pub fn from_spec(spec: &SelectSpec) -> QueryResult<Self> {
        if spec.properties.is_empty() {
            return Err(QueryError::invalid_argument(
                "a selector requires at least one property",
            ));
        }

        let schema = E::schema();
        let mut columns: Vec<ProjectedColumn> = Vec::with_capacity(spec.properties.len());
        for selector in &spec.properties {
            let field = schema.resolve(&selector.name)?;
            if columns
                .iter()
                .any(|c| c.key.eq_ignore_ascii_case(&selector.name))
            {
                return Err(QueryError::invalid_argument(format!(
                    "property '{}' is selected more than once",
                    selector.name
                )));
            }
            let kind = schema.field(field).field_type().kind;
            if selector.is_structured && kind != FieldKind::Text {
                return Err(QueryError::Projection {
                    property: selector.name.clone(),
                    message: format!("structured decoding needs a Text field, found {}", kind.name()),
                });
            }
            columns.push(ProjectedColumn {
                key: selector.name.clone(),
                field,
                structured: selector.is_structured,
            });
        }

        Ok(Self {
            columns,
            _entity: PhantomData,
        })
    }

    /// Projects one entity.
    ///
    /// A structured column holding null stays null; a payload that fails to
    /// decode is an error, never a silent null.
    pub fn apply(&self, entity: &E) -> QueryResult<Row> {
        let schema = E::schema();
        let mut row = Row {
            columns: Vec::with_capacity(self.columns.len()),
        };
        for column in &self.columns {
            let value = schema.read(entity, column.field);
            let value = if column.structured {
                decode_structured(&column.key, value)?
            } else {
                value
            };
            row.push(column.key.clone(), value);
        }
        Ok(row)
    }
}

fn decode_structured(key: &str, value: Value) -> QueryResult<Value> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::Text(payload) => serde_json::from_str(&payload)
            .map(Value::Json)
            .map_err(|e| QueryError::Projection {
                property: key.to_string(),
                message: e.to_string(),
            }),
        other => Err(QueryError::Projection {
            property: key.to_string(),
            message: format!("expected a Text payload, found {}", other.type_name()),
        }),
    }
}

impl<E> Clone for Projection<E> {
    fn clone(&self) -> Self {
        Self {
            columns: self.columns.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E> fmt::Debug for Projection<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Projection").field(&self.columns).finish()
    }
}
