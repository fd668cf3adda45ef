//! alder - an address lookup query engine
//!
//! Answers free-text fuzzy search, polygon containment with keyset
//! pagination, and proximity search over a geospatially indexed document
//! store, with optional categorical filtering on every query kind.

pub mod error;
pub mod geometry;
pub mod models;
pub mod paginate;
pub mod query;
pub mod rank;
pub mod service;
pub mod store;

pub use error::QueryError;
pub use models::{Address, BatchResult, FeatureCollection};
pub use service::{AddressQueryService, ContainmentRequest, ProximityRequest, SearchRequest};
