//! Field descriptors: type tags and typed accessors.

use std::fmt;

use crate::types::{EnumValue, Value, ValueTypeError};

/// Describes an enumeration's members for coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnumDescriptor {
    /// The enumeration's name.
    pub name: &'static str,
    /// `(name, ordinal)` pairs.
    pub variants: &'static [(&'static str, i64)],
}

impl EnumDescriptor {
    /// Looks up a member by ordinal.
    pub fn by_ordinal(&self, ordinal: i64) -> Option<EnumValue> {
        self.variants
            .iter()
            .find(|(_, o)| *o == ordinal)
            .map(|(name, ordinal)| EnumValue {
                ordinal: *ordinal,
                name,
            })
    }

    /// Looks up a member by name, ignoring ASCII case.
    pub fn by_name(&self, name: &str) -> Option<EnumValue> {
        self.variants
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(name, ordinal)| EnumValue {
                ordinal: *ordinal,
                name,
            })
    }
}

/// The storage type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Boolean.
    Bool,
    /// 64-bit signed integer.
    Int,
    /// 64-bit float.
    Float,
    /// Exact decimal.
    Decimal,
    /// Text.
    Text,
    /// UUID identifier.
    Uuid,
    /// Binary blob, written as base64 on the wire.
    Binary,
    /// UTC timestamp.
    DateTime,
    /// Calendar date.
    Date,
    /// Enumeration.
    Enum(&'static EnumDescriptor),
}

impl FieldKind {
    /// Returns the type name used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Bool => "Bool",
            FieldKind::Int => "Int",
            FieldKind::Float => "Float",
            FieldKind::Decimal => "Decimal",
            FieldKind::Text => "Text",
            FieldKind::Uuid => "Uuid",
            FieldKind::Binary => "Binary",
            FieldKind::DateTime => "DateTime",
            FieldKind::Date => "Date",
            FieldKind::Enum(descriptor) => descriptor.name,
        }
    }

    /// Returns true if `<`, `<=`, `>`, `>=` are meaningful for this kind.
    pub fn is_ordered(&self) -> bool {
        !matches!(self, FieldKind::Bool | FieldKind::Uuid | FieldKind::Binary)
    }
}

/// A field's kind plus nullability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldType {
    /// The underlying kind.
    pub kind: FieldKind,
    /// Whether the field may hold [`Value::Null`].
    pub nullable: bool,
}

impl FieldType {
    /// A non-nullable field of the given kind.
    pub const fn required(kind: FieldKind) -> Self {
        Self {
            kind,
            nullable: false,
        }
    }

    /// A nullable field of the given kind.
    pub const fn optional(kind: FieldKind) -> Self {
        Self {
            kind,
            nullable: true,
        }
    }

    /// Non-nullable text.
    pub const fn text() -> Self {
        Self::required(FieldKind::Text)
    }

    /// Non-nullable integer.
    pub const fn int() -> Self {
        Self::required(FieldKind::Int)
    }

    /// Non-nullable enumeration.
    pub const fn enumeration(descriptor: &'static EnumDescriptor) -> Self {
        Self::required(FieldKind::Enum(descriptor))
    }

    /// Returns the same kind marked nullable.
    pub const fn nullable(self) -> Self {
        Self::optional(self.kind)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nullable {
            write!(f, "{}?", self.kind.name())
        } else {
            write!(f, "{}", self.kind.name())
        }
    }
}

/// Reads a field from an entity.
pub type Getter<E> = fn(&E) -> Value;

/// Writes a coerced value back into an entity field.
pub type Setter<E> = fn(&mut E, Value) -> Result<(), ValueTypeError>;

/// Metadata and accessors for one entity field.
pub struct FieldDescriptor<E> {
    name: &'static str,
    field_type: FieldType,
    getter: Getter<E>,
    setter: Option<Setter<E>>,
}

impl<E> FieldDescriptor<E> {
    pub(crate) fn new(
        name: &'static str,
        field_type: FieldType,
        getter: Getter<E>,
        setter: Option<Setter<E>>,
    ) -> Self {
        Self {
            name,
            field_type,
            getter,
            setter,
        }
    }

    /// The field's declared name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The field's declared type.
    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    /// Returns true if mutations may write this field.
    pub fn is_writable(&self) -> bool {
        self.setter.is_some()
    }

    /// Reads the field.
    pub fn read(&self, entity: &E) -> Value {
        (self.getter)(entity)
    }

    /// Writes the field. Read-only fields are left untouched and report the
    /// value's type as unexpected.
    pub fn write(&self, entity: &mut E, value: Value) -> Result<(), ValueTypeError> {
        match self.setter {
            Some(setter) => setter(entity, value),
            None => Err(ValueTypeError {
                expected: "writable field",
                found: value.type_name(),
            }),
        }
    }
}

impl<E> fmt::Debug for FieldDescriptor<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("field_type", &self.field_type)
            .field("writable", &self.setter.is_some())
            .finish()
    }
}

/// A resolved reference to a field in an [`EntitySchema`](super::EntitySchema).
///
/// Holds the field's position in the metadata table, so evaluating a
/// compiled expression never repeats the name lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldRef {
    index: usize,
    name: &'static str,
}

impl FieldRef {
    pub(crate) fn new(index: usize, name: &'static str) -> Self {
        Self { index, name }
    }

    /// Position in the metadata table.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The field's declared name.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
