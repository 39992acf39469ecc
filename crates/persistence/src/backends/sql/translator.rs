//! Rendering of compiled expressions as SQLite statements.

use std::marker::PhantomData;

use crate::core::{PlanShape, QueryPlan};
use crate::query::{CompareOp, Expr, Mutation, OrderKey, Predicate, Projection};
use crate::schema::{Entity, FieldRef};
use crate::types::Pagination;

use super::fragment::{SqlFragment, SqlParam, quote_ident};

/// Column holding the in-group row number of grouped queries.
const ROW_NUMBER_COLUMN: &str = "__rn";

/// Translates plans, predicates and mutations over `E` into parameterised
/// SQL for one table.
///
/// Semantics follow the in-memory evaluator: `<>` also matches nulls on
/// nullable columns, ordering comparisons never match nulls, and `Contains`
/// is a case-sensitive substring test (`instr`). Structured projection
/// columns are selected as text; decoding them is left to the caller.
#[derive(Debug, Clone)]
pub struct SqlTranslator<E> {
    table: String,
    _entity: PhantomData<fn(&E)>,
}

impl<E: Entity> SqlTranslator<E> {
    /// Creates a translator for the named table.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            _entity: PhantomData,
        }
    }

    /// Creates a translator whose table is named after the entity.
    pub fn for_entity() -> Self {
        Self::new(E::schema().name())
    }

    /// The target table.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Renders a `SELECT` for a query plan.
    ///
    /// Grouped plans keep one row per key with `ROW_NUMBER() OVER (PARTITION
    /// BY key ORDER BY ...)`; the order of the groups themselves is left to
    /// the database.
    pub fn select(&self, plan: &QueryPlan<E>) -> SqlFragment {
        let mut out = SqlFragment::default();
        match &plan.shape {
            PlanShape::Ordered(order) => {
                out.push_sql(&format!(
                    "SELECT {} FROM {}",
                    self.columns(plan.projection.as_ref()),
                    quote_ident(&self.table)
                ));
                self.push_where(&mut out, plan.filter.as_ref());
                if let Some(order) = order {
                    out.push_sql(&format!(" ORDER BY {}", order_term(order)));
                }
            }
            PlanShape::Grouped {
                key,
                representative,
            } => {
                let mut window = format!("PARTITION BY {}", quote_ident(key.field().name()));
                if let Some(order) = representative.order() {
                    window.push_str(&format!(" ORDER BY {}", order_term(order)));
                }
                out.push_sql(&format!(
                    "SELECT {} FROM (SELECT *, ROW_NUMBER() OVER ({}) AS {} FROM {}",
                    self.columns(plan.effective_projection()),
                    window,
                    quote_ident(ROW_NUMBER_COLUMN),
                    quote_ident(&self.table)
                ));
                self.push_where(&mut out, plan.filter.as_ref());
                out.push_sql(&format!(") WHERE {} = 1", quote_ident(ROW_NUMBER_COLUMN)));
            }
        }
        push_pagination(&mut out, plan.pagination);
        out
    }

    /// Renders `SELECT COUNT(*)`.
    pub fn count(&self, filter: Option<&Predicate<E>>) -> SqlFragment {
        let mut out = SqlFragment::new(format!("SELECT COUNT(*) FROM {}", quote_ident(&self.table)));
        self.push_where(&mut out, filter);
        out
    }

    /// Renders an `UPDATE ... SET` for a mutation.
    pub fn update(&self, filter: Option<&Predicate<E>>, mutation: &Mutation<E>) -> SqlFragment {
        let mut out = SqlFragment::new(format!("UPDATE {} SET ", quote_ident(&self.table)));
        let mut assignments = Vec::with_capacity(mutation.assignments().len());
        for assignment in mutation.assignments() {
            let placeholder = out.add_param(SqlParam::from(&assignment.value));
            assignments.push(format!(
                "{} = {}",
                quote_ident(assignment.field.name()),
                placeholder
            ));
        }
        out.push_sql(&assignments.join(", "));
        self.push_where(&mut out, filter);
        out
    }

    /// Renders a `DELETE`.
    pub fn delete(&self, filter: Option<&Predicate<E>>) -> SqlFragment {
        let mut out = SqlFragment::new(format!("DELETE FROM {}", quote_ident(&self.table)));
        self.push_where(&mut out, filter);
        out
    }

    /// Renders a predicate on its own, as used in a `WHERE` clause.
    pub fn predicate(&self, predicate: &Predicate<E>) -> SqlFragment {
        let mut out = SqlFragment::default();
        let sql = self.render(predicate.expr(), &mut out);
        out.push_sql(&sql);
        out
    }

    fn push_where(&self, out: &mut SqlFragment, filter: Option<&Predicate<E>>) {
        if let Some(filter) = filter {
            let sql = self.render(filter.expr(), out);
            out.push_sql(" WHERE ");
            out.push_sql(&sql);
        }
    }

    fn columns(&self, projection: Option<&Projection<E>>) -> String {
        match projection {
            Some(projection) => projection
                .columns()
                .iter()
                .map(|c| format!("{} AS {}", quote_ident(c.field.name()), quote_ident(&c.key)))
                .collect::<Vec<_>>()
                .join(", "),
            None => E::schema()
                .fields()
                .map(|(field, _)| quote_ident(field.name()))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    fn render(&self, expr: &Expr, out: &mut SqlFragment) -> String {
        match expr {
            Expr::Compare { field, op, value } => {
                let column = quote_ident(field.name());
                match (op, value.is_null()) {
                    (CompareOp::Eq, true) => format!("{} IS NULL", column),
                    (CompareOp::Ne, true) => format!("{} IS NOT NULL", column),
                    (CompareOp::Ne, false) if self.is_nullable(*field) => {
                        let placeholder = out.add_param(SqlParam::from(value));
                        format!("({} <> {} OR {} IS NULL)", column, placeholder, column)
                    }
                    _ => {
                        let placeholder = out.add_param(SqlParam::from(value));
                        format!("{} {} {}", column, op.symbol(), placeholder)
                    }
                }
            }
            Expr::Contains { field, needle } => {
                let placeholder = out.add_param(SqlParam::string(needle.as_str()));
                format!("instr({}, {}) > 0", quote_ident(field.name()), placeholder)
            }
            Expr::IsNull(field) => format!("{} IS NULL", quote_ident(field.name())),
            Expr::IsNotNull(field) => format!("{} IS NOT NULL", quote_ident(field.name())),
            Expr::And(left, right) => {
                let left = self.render(left, out);
                let right = self.render(right, out);
                format!("({} AND {})", left, right)
            }
            Expr::Or(left, right) => {
                let left = self.render(left, out);
                let right = self.render(right, out);
                format!("({} OR {})", left, right)
            }
        }
    }

    fn is_nullable(&self, field: FieldRef) -> bool {
        E::schema().field(field).field_type().nullable
    }
}

fn order_term<E>(order: &OrderKey<E>) -> String {
    format!(
        "{} {}",
        quote_ident(order.field().name()),
        order.direction().keyword()
    )
}

fn push_pagination(out: &mut SqlFragment, pagination: Pagination) {
    if pagination.is_unbounded() {
        return;
    }
    // SQLite needs a LIMIT before OFFSET; -1 means no limit.
    let limit = match pagination.limit() {
        Some(limit) => out.add_param(SqlParam::integer(limit as i64)),
        None => "-1".to_string(),
    };
    let offset = out.add_param(SqlParam::integer(i64::from(pagination.skip)));
    out.push_sql(&format!(" LIMIT {} OFFSET {}", limit, offset));
}
