//! Translation of list requests into store query plans.
//!
//! Each resource declares which fields are searched by `search_term` and
//! which may be filtered, and how. [`build_plan`] turns a [`ListParams`] into
//! a [`QueryPlan`] over those declarations; the same plan runs unchanged on
//! every [`DocumentStore`](crate::db::DocumentStore) implementation.

mod builder;
mod fields;
mod predicate;

pub use builder::{
    build_plan, ListParams, Pagination, QueryPlan, DAY_KEY, END_DATE_KEY, INVALID_DATE_MESSAGE,
    START_DATE_KEY,
};
pub use fields::{FieldKind, FieldSpec, ResourceFields};
pub use predicate::{compare_values, Clause, Predicate, Sort, SortDirection};
