//! SQL translation of compiled expressions.
//!
//! [`SqlTranslator`] walks predicate trees, orderings, groupings, mutations
//! and pagination windows and renders them as parameterised SQLite
//! statements ([`SqlFragment`]). It does not execute anything; it shows how a
//! relational backend pushes a [`QueryPlan`](crate::core::QueryPlan) down to
//! the database.
//!
//! # Example
//!
//! ```
//! # use std::sync::OnceLock;
//! # use sieve_persistence::schema::{BaseFields, Entity, EntitySchema, FieldType};
//! # use sieve_persistence::types::FromValue;
//! # #[derive(Debug, Clone)]
//! # struct Tag { base: BaseFields, label: String }
//! # impl Entity for Tag {
//! #     fn schema() -> &'static EntitySchema<Self> {
//! #         static SCHEMA: OnceLock<EntitySchema<Tag>> = OnceLock::new();
//! #         SCHEMA.get_or_init(|| {
//! #             EntitySchema::<Self>::builder("Tag")
//! #                 .base_fields()
//! #                 .field("Label", FieldType::text(), |t| t.label.clone().into(), |t, v| {
//! #                     t.label = String::from_value(v)?;
//! #                     Ok(())
//! #                 })
//! #                 .build()
//! #         })
//! #     }
//! #     fn base(&self) -> &BaseFields { &self.base }
//! #     fn base_mut(&mut self) -> &mut BaseFields { &mut self.base }
//! # }
//! use sieve_persistence::backends::sql::SqlTranslator;
//! use sieve_persistence::query::build_predicate;
//! use sieve_persistence::types::FilterSpec;
//!
//! let predicate = build_predicate::<Tag>(&FilterSpec::eq("Label", "rust")).unwrap();
//! let sql = SqlTranslator::<Tag>::for_entity().delete(Some(&predicate));
//! assert_eq!(sql.sql, r#"DELETE FROM "Tag" WHERE "Label" = ?1"#);
//! ```

mod fragment;
mod translator;

pub use fragment::{SqlFragment, SqlParam, quote_ident};
pub use translator::SqlTranslator;
