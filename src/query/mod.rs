//! Typed query construction: predicates, categorical filters, and the
//! spatial query builder.

pub mod builder;
pub mod filter;
pub mod predicate;

pub use filter::FilterInput;
pub use predicate::{Field, Predicate};
