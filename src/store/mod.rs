//! Store seam.
//!
//! The query engine talks to any geospatially indexed document store through
//! [`AddressStore`]. The production adapter lowers typed predicates into
//! Elasticsearch query DSL; the in-memory store evaluates them directly and
//! backs the tests.

pub mod elastic;
pub mod memory;
pub mod translate;

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::Address;
use crate::query::predicate::Predicate;

pub use elastic::{ElasticStore, EsClient};
pub use memory::MemoryStore;

/// Result cap applied when a query carries no explicit limit. Mirrors the
/// Elasticsearch result window.
pub const DEFAULT_RESULT_CAP: usize = 10_000;

/// Which query operation a fetch belongs to; carried into store errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOp {
    Search,
    Containment,
    Proximity,
}

impl fmt::Display for QueryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryOp::Search => write!(f, "search"),
            QueryOp::Containment => write!(f, "containment"),
            QueryOp::Proximity => write!(f, "proximity"),
        }
    }
}

/// A store fetch failure, wrapped with the operation it happened in. Never
/// retried by the engine.
#[derive(Debug, Clone, Error)]
#[error("{op} fetch failed: {message}")]
pub struct StoreError {
    pub op: QueryOp,
    pub message: String,
}

impl StoreError {
    pub fn new(op: QueryOp, err: impl fmt::Display) -> Self {
        Self {
            op,
            message: err.to_string(),
        }
    }
}

/// Result ordering for a fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum Order {
    /// Ascending record key; the pagination order.
    RecordKeyAsc,
    /// Ascending spherical distance from the origin.
    DistanceAsc { lon: f64, lat: f64 },
}

/// A bounded, ordered fetch against the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreQuery {
    pub predicate: Predicate,
    pub order: Order,
    /// `None` falls back to the store's natural result cap.
    pub limit: Option<usize>,
}

/// Read access to the address collection.
#[async_trait]
pub trait AddressStore: Send + Sync {
    /// Execute one bounded fetch. A query matching no records is an empty
    /// `Ok`, not an error.
    async fn fetch(&self, op: QueryOp, query: &StoreQuery) -> Result<Vec<Address>, StoreError>;
}
