//! Per-entity metadata tables.
//!
//! Every entity type exposes one [`EntitySchema`], built once and cached in a
//! `static OnceLock`. It maps field names to typed getters and setters plus a
//! [`FieldType`] tag, and lists the entity's navigations and uniqueness
//! constraints. The query compiler resolves every property name against this
//! table; nothing is looked up by reflection at execution time.
//!
//! # Example
//!
//! ```
//! use std::sync::OnceLock;
//! use sieve_persistence::schema::{BaseFields, Entity, EntitySchema, FieldType};
//! use sieve_persistence::types::FromValue;
//!
//! #[derive(Debug, Clone)]
//! struct Tag {
//!     base: BaseFields,
//!     label: String,
//! }
//!
//! impl Entity for Tag {
//!     fn schema() -> &'static EntitySchema<Self> {
//!         static SCHEMA: OnceLock<EntitySchema<Tag>> = OnceLock::new();
//!         SCHEMA.get_or_init(|| {
//!             EntitySchema::<Self>::builder("Tag")
//!                 .base_fields()
//!                 .field(
//!                     "Label",
//!                     FieldType::text(),
//!                     |t| t.label.clone().into(),
//!                     |t, v| {
//!                         t.label = String::from_value(v)?;
//!                         Ok(())
//!                     },
//!                 )
//!                 .build()
//!         })
//!     }
//!
//!     fn base(&self) -> &BaseFields {
//!         &self.base
//!     }
//!
//!     fn base_mut(&mut self) -> &mut BaseFields {
//!         &mut self.base
//!     }
//! }
//!
//! let field = Tag::schema().resolve("label").unwrap();
//! assert_eq!(field.name(), "Label");
//! ```

mod base;
mod field;

use std::collections::HashMap;
use std::fmt;

use uuid::Uuid;

pub use base::BaseFields;
pub use field::{
    EnumDescriptor, FieldDescriptor, FieldKind, FieldRef, FieldType, Getter, Setter,
};

use crate::error::{QueryError, QueryResult};

/// A persisted entity type with a metadata table.
pub trait Entity: Clone + fmt::Debug + Send + Sync + 'static {
    /// Returns the cached metadata table for this type.
    fn schema() -> &'static EntitySchema<Self>;

    /// The fields shared by every entity.
    fn base(&self) -> &BaseFields;

    /// Mutable access to the shared fields.
    fn base_mut(&mut self) -> &mut BaseFields;

    /// The entity's identifier.
    fn id(&self) -> Uuid {
        self.base().id
    }
}

/// An eagerly loadable relation, such as a child collection.
pub struct NavigationDescriptor<E> {
    name: &'static str,
    unload: fn(&mut E),
}

impl<E> NavigationDescriptor<E> {
    /// The navigation's declared name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Clears the navigation on a materialised entity.
    pub fn unload(&self, entity: &mut E) {
        (self.unload)(entity)
    }
}

impl<E> fmt::Debug for NavigationDescriptor<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationDescriptor")
            .field("name", &self.name)
            .finish()
    }
}

/// A set of fields whose combined values must be unique across the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueConstraint {
    name: String,
    fields: Vec<FieldRef>,
}

impl UniqueConstraint {
    /// The constraint's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The constrained fields.
    pub fn fields(&self) -> &[FieldRef] {
        &self.fields
    }
}

/// The metadata table of one entity type.
pub struct EntitySchema<E> {
    name: &'static str,
    fields: Vec<FieldDescriptor<E>>,
    exact: HashMap<&'static str, usize>,
    folded: HashMap<String, usize>,
    navigations: Vec<NavigationDescriptor<E>>,
    unique: Vec<UniqueConstraint>,
    modified_at: Option<FieldRef>,
}

impl<E> EntitySchema<E> {
    /// Starts building a schema for the named entity.
    ///
    /// Name the entity type at the call site (`EntitySchema::<Self>::builder`)
    /// so the getter and setter closures can be type-checked.
    pub fn builder(name: &'static str) -> SchemaBuilder<E> {
        SchemaBuilder {
            name,
            fields: Vec::new(),
            navigations: Vec::new(),
            unique: Vec::new(),
            modified_at: None,
        }
    }

    /// The entity's name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Resolves a property name to a field.
    ///
    /// An exact match wins; otherwise the name is matched ignoring ASCII case.
    pub fn resolve(&self, property: &str) -> QueryResult<FieldRef> {
        let index = self
            .exact
            .get(property)
            .or_else(|| self.folded.get(&property.to_ascii_lowercase()))
            .copied()
            .ok_or_else(|| QueryError::UnknownProperty {
                entity: self.name.to_string(),
                property: property.to_string(),
            })?;
        Ok(FieldRef::new(index, self.fields[index].name()))
    }

    /// Returns the descriptor behind a resolved field.
    pub fn field(&self, field: FieldRef) -> &FieldDescriptor<E> {
        &self.fields[field.index()]
    }

    /// Reads a resolved field from an entity.
    pub fn read(&self, entity: &E, field: FieldRef) -> crate::types::Value {
        self.fields[field.index()].read(entity)
    }

    /// All fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (FieldRef, &FieldDescriptor<E>)> {
        self.fields
            .iter()
            .enumerate()
            .map(|(i, d)| (FieldRef::new(i, d.name()), d))
    }

    /// Resolves a navigation by name, ignoring ASCII case.
    pub fn navigation(&self, name: &str) -> QueryResult<&NavigationDescriptor<E>> {
        self.navigations
            .iter()
            .find(|n| n.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| QueryError::UnknownProperty {
                entity: self.name.to_string(),
                property: name.to_string(),
            })
    }

    /// All declared navigations.
    pub fn navigations(&self) -> &[NavigationDescriptor<E>] {
        &self.navigations
    }

    /// All declared uniqueness constraints.
    pub fn unique_constraints(&self) -> &[UniqueConstraint] {
        &self.unique
    }

    /// The modification timestamp field, if the entity declares one.
    pub fn modified_at(&self) -> Option<FieldRef> {
        self.modified_at
    }
}

impl<E> fmt::Debug for EntitySchema<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntitySchema")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("navigations", &self.navigations)
            .field("unique", &self.unique)
            .finish()
    }
}

/// Builder for [`EntitySchema`].
pub struct SchemaBuilder<E> {
    name: &'static str,
    fields: Vec<FieldDescriptor<E>>,
    navigations: Vec<NavigationDescriptor<E>>,
    unique: Vec<(String, Vec<&'static str>)>,
    modified_at: Option<&'static str>,
}

impl<E> SchemaBuilder<E> {
    /// Adds a writable field.
    pub fn field(
        mut self,
        name: &'static str,
        field_type: FieldType,
        getter: Getter<E>,
        setter: Setter<E>,
    ) -> Self {
        self.fields
            .push(FieldDescriptor::new(name, field_type, getter, Some(setter)));
        self
    }

    /// Adds a field that mutations may not write.
    pub fn read_only(mut self, name: &'static str, field_type: FieldType, getter: Getter<E>) -> Self {
        self.fields
            .push(FieldDescriptor::new(name, field_type, getter, None));
        self
    }

    /// Declares an eagerly loadable navigation.
    pub fn navigation(mut self, name: &'static str, unload: fn(&mut E)) -> Self {
        self.navigations.push(NavigationDescriptor { name, unload });
        self
    }

    /// Declares a uniqueness constraint over the named fields.
    pub fn unique(mut self, name: impl Into<String>, fields: &[&'static str]) -> Self {
        self.unique.push((name.into(), fields.to_vec()));
        self
    }

    /// Marks the field used for "most recently modified first" ordering.
    pub fn modified_at(mut self, name: &'static str) -> Self {
        self.modified_at = Some(name);
        self
    }

    /// Validates and builds the schema.
    ///
    /// # Panics
    ///
    /// Panics if the declaration is inconsistent (duplicate field names,
    /// constraints over unknown fields). Schemas are static declarations, so
    /// this surfaces on first use like any other programming error. Use
    /// [`SchemaBuilder::try_build`] to handle the error instead.
    pub fn build(self) -> EntitySchema<E> {
        match self.try_build() {
            Ok(schema) => schema,
            Err(err) => panic!("invalid entity schema: {err}"),
        }
    }

    /// Validates and builds the schema.
    pub fn try_build(self) -> QueryResult<EntitySchema<E>> {
        let mut exact = HashMap::with_capacity(self.fields.len());
        let mut folded = HashMap::with_capacity(self.fields.len());
        for (index, field) in self.fields.iter().enumerate() {
            if folded
                .insert(field.name().to_ascii_lowercase(), index)
                .is_some()
            {
                return Err(QueryError::invalid_argument(format!(
                    "duplicate field '{}' on entity '{}'",
                    field.name(),
                    self.name
                )));
            }
            exact.insert(field.name(), index);
        }

        let mut schema = EntitySchema {
            name: self.name,
            fields: self.fields,
            exact,
            folded,
            navigations: self.navigations,
            unique: Vec::with_capacity(self.unique.len()),
            modified_at: None,
        };

        for (name, fields) in self.unique {
            if fields.is_empty() {
                return Err(QueryError::invalid_argument(format!(
                    "unique constraint '{name}' names no fields"
                )));
            }
            let fields = fields
                .iter()
                .map(|f| schema.resolve(f))
                .collect::<QueryResult<Vec<_>>>()?;
            schema.unique.push(UniqueConstraint { name, fields });
        }

        if let Some(name) = self.modified_at {
            let field = schema.resolve(name)?;
            if schema.field(field).field_type().kind != FieldKind::DateTime {
                return Err(QueryError::invalid_argument(format!(
                    "modification timestamp '{name}' must be a DateTime field"
                )));
            }
            schema.modified_at = Some(field);
        }

        Ok(schema)
    }
}
