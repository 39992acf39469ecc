//! Boolean predicates compiled from filter descriptions.
//!
//! A [`Predicate`] is a tagged expression tree ([`Expr`]) over resolved
//! fields. The in-memory backend evaluates it directly; the SQL backend walks
//! it to render a `WHERE` clause.

use std::cmp::Ordering;
use std::fmt;
use std::marker::PhantomData;

use crate::error::{QueryError, QueryResult};
use crate::schema::{Entity, EntitySchema, FieldKind, FieldRef};
use crate::types::{Combinator, CombinedFilter, FilterOperator, FilterSpec, Value};

use super::coerce::coerce;

/// Binary comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    /// `=`
    Eq,
    /// `<>`
    Ne,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `<`
    Lt,
    /// `<=`
    Le,
}

impl CompareOp {
    /// Returns the SQL spelling of the operator.
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
        }
    }

    fn holds(&self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Ne => ordering != Ordering::Equal,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Ge => ordering != Ordering::Less,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Le => ordering != Ordering::Greater,
        }
    }

    fn from_filter(operator: FilterOperator) -> Option<Self> {
        match operator {
            FilterOperator::Equal => Some(CompareOp::Eq),
            FilterOperator::NotEqual => Some(CompareOp::Ne),
            FilterOperator::GreaterThan => Some(CompareOp::Gt),
            FilterOperator::GreaterThanOrEqual => Some(CompareOp::Ge),
            FilterOperator::LessThan => Some(CompareOp::Lt),
            FilterOperator::LessThanOrEqual => Some(CompareOp::Le),
            FilterOperator::Contains | FilterOperator::IsNull | FilterOperator::IsNotNull => None,
        }
    }
}

/// A node of a compiled predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `field <op> value`.
    ///
    /// Equality against [`Value::Null`] tests for absence; ordering against
    /// null never matches.
    Compare {
        /// Left-hand field.
        field: FieldRef,
        /// Operator.
        op: CompareOp,
        /// Coerced constant.
        value: Value,
    },
    /// Substring test on a text field.
    Contains {
        /// The text field.
        field: FieldRef,
        /// Case-sensitive substring.
        needle: String,
    },
    /// The field holds no value.
    IsNull(FieldRef),
    /// The field holds a value.
    IsNotNull(FieldRef),
    /// Both sides hold; the right side is skipped when the left fails.
    And(Box<Expr>, Box<Expr>),
    /// Either side holds; the right side is skipped when the left holds.
    Or(Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Evaluates the expression against one entity.
    pub fn evaluate<E>(&self, schema: &EntitySchema<E>, entity: &E) -> bool {
        match self {
            Expr::Compare { field, op, value } => {
                let actual = schema.read(entity, *field);
                match op {
                    CompareOp::Eq => equals(&actual, value),
                    CompareOp::Ne => !equals(&actual, value),
                    _ => actual
                        .compare(value)
                        .is_some_and(|ordering| op.holds(ordering)),
                }
            }
            Expr::Contains { field, needle } => schema
                .read(entity, *field)
                .as_text()
                .is_some_and(|text| text.contains(needle.as_str())),
            Expr::IsNull(field) => schema.read(entity, *field).is_null(),
            Expr::IsNotNull(field) => !schema.read(entity, *field).is_null(),
            Expr::And(left, right) => {
                left.evaluate(schema, entity) && right.evaluate(schema, entity)
            }
            Expr::Or(left, right) => {
                left.evaluate(schema, entity) || right.evaluate(schema, entity)
            }
        }
    }

    /// Returns the fields referenced by the expression, left to right.
    pub fn fields(&self) -> Vec<FieldRef> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields(&self, out: &mut Vec<FieldRef>) {
        match self {
            Expr::Compare { field, .. }
            | Expr::Contains { field, .. }
            | Expr::IsNull(field)
            | Expr::IsNotNull(field) => out.push(*field),
            Expr::And(left, right) | Expr::Or(left, right) => {
                left.collect_fields(out);
                right.collect_fields(out);
            }
        }
    }
}

fn equals(actual: &Value, expected: &Value) -> bool {
    match (actual.is_null(), expected.is_null()) {
        (true, true) => true,
        (false, false) => actual.compare(expected) == Some(Ordering::Equal),
        _ => false,
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Compare { field, op, value } => write!(f, "{} {} {}", field, op.symbol(), value),
            Expr::Contains { field, needle } => write!(f, "{} CONTAINS \"{}\"", field, needle),
            Expr::IsNull(field) => write!(f, "{} IS NULL", field),
            Expr::IsNotNull(field) => write!(f, "{} IS NOT NULL", field),
            Expr::And(left, right) => write!(f, "({} AND {})", left, right),
            Expr::Or(left, right) => write!(f, "({} OR {})", left, right),
        }
    }
}

/// A compiled boolean test over entities of type `E`.
pub struct Predicate<E> {
    expr: Expr,
    _entity: PhantomData<fn(&E) -> bool>,
}

impl<E> Predicate<E> {
    fn from_expr(expr: Expr) -> Self {
        Self {
            expr,
            _entity: PhantomData,
        }
    }

    /// The underlying expression tree.
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Combines with `other` so that both must hold.
    pub fn and(self, other: Predicate<E>) -> Self {
        Self::from_expr(Expr::And(Box::new(self.expr), Box::new(other.expr)))
    }

    /// Combines with `other` so that either may hold.
    pub fn or(self, other: Predicate<E>) -> Self {
        Self::from_expr(Expr::Or(Box::new(self.expr), Box::new(other.expr)))
    }
}

impl<E: Entity> Predicate<E> {
    /// Compiles a single filter.
    pub fn from_filter(spec: &FilterSpec) -> QueryResult<Self> {
        let schema = E::schema();
        let field = schema.resolve(&spec.property_name)?;
        let field_type = schema.field(field).field_type();

        if !supports(field_type.kind, spec.operator) {
            return Err(QueryError::UnsupportedOperator {
                operator: spec.operator.to_string(),
                property: field.name().to_string(),
                field_type: field_type.to_string(),
                allowed: FilterOperator::list(&allowed_operators(field_type.kind)),
            });
        }

        let expr = match spec.operator {
            FilterOperator::IsNull => Expr::IsNull(field),
            FilterOperator::IsNotNull => Expr::IsNotNull(field),
            FilterOperator::Contains => {
                let needle = spec.value.clone().ok_or_else(|| {
                    QueryError::invalid_value(
                        None,
                        field_type.to_string(),
                        "Contains requires a non-null value",
                    )
                })?;
                Expr::Contains { field, needle }
            }
            operator => {
                let op = CompareOp::from_filter(operator).ok_or_else(|| {
                    QueryError::invalid_argument(format!("operator '{operator}' has no comparison"))
                })?;
                let value = coerce(spec.value.as_deref(), &field_type)?;
                Expr::Compare { field, op, value }
            }
        };
        Ok(Self::from_expr(expr))
    }

    /// Compiles a list of filters folded left to right with one combinator.
    ///
    /// An empty list is rejected before anything is evaluated.
    pub fn combine(spec: &CombinedFilter) -> QueryResult<Self> {
        let mut filters = spec.filters.iter();
        let first = filters.next().ok_or_else(|| {
            QueryError::invalid_argument("a combined filter requires at least one filter")
        })?;
        filters.try_fold(Self::from_filter(first)?, |acc, filter| {
            let next = Self::from_filter(filter)?;
            Ok(match spec.combinator {
                Combinator::And => acc.and(next),
                Combinator::Or => acc.or(next),
            })
        })
    }

    /// Evaluates the predicate against one entity.
    pub fn evaluate(&self, entity: &E) -> bool {
        self.expr.evaluate(E::schema(), entity)
    }
}

impl<E> Clone for Predicate<E> {
    fn clone(&self) -> Self {
        Self::from_expr(self.expr.clone())
    }
}

impl<E> fmt::Debug for Predicate<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Predicate").field(&self.expr).finish()
    }
}

impl<E> fmt::Display for Predicate<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expr)
    }
}

fn supports(kind: FieldKind, operator: FilterOperator) -> bool {
    match operator {
        FilterOperator::Equal
        | FilterOperator::NotEqual
        | FilterOperator::IsNull
        | FilterOperator::IsNotNull => true,
        FilterOperator::Contains => kind == FieldKind::Text,
        FilterOperator::GreaterThan
        | FilterOperator::GreaterThanOrEqual
        | FilterOperator::LessThan
        | FilterOperator::LessThanOrEqual => kind.is_ordered(),
    }
}

fn allowed_operators(kind: FieldKind) -> Vec<FilterOperator> {
    FilterOperator::ALL
        .iter()
        .copied()
        .filter(|op| supports(kind, *op))
        .collect()
}
