//! Error taxonomy for the query engine.
//!
//! All failures surface as typed errors; a query that matches zero records
//! is a successful empty result. No partial results on error, no retries.

use thiserror::Error;

use crate::geometry::wkt::WktError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum QueryError {
    /// Malformed WKT region, surfaced with the offending fragment.
    #[error("geometry parse failed: {0}")]
    GeometryParse(#[from] WktError),
    /// Cursor string does not decode to a record key.
    #[error("invalid cursor {given:?}")]
    InvalidCursor { given: String },
    /// Structurally invalid request.
    #[error("invalid request: {0}")]
    Validation(String),
    /// Store fetch failed; retry policy belongs to the caller.
    #[error(transparent)]
    Store(#[from] StoreError),
}
