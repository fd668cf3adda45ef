//! Keyset pagination over containment results.
//!
//! Pages by "last seen record key" rather than numeric offset, which keeps
//! deep pages cheap on large containment result sets.

use crate::error::QueryError;
use crate::models::{Address, RecordKey};
use crate::query::predicate::Predicate;
use crate::store::{AddressStore, Order, QueryOp, StoreQuery};

/// Page size when the request names neither a batch size nor a limit.
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Opaque pagination cursor wrapping the last-seen record key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor(pub RecordKey);

impl Cursor {
    /// Decode the wire form. Invalid encodings are rejected before any store
    /// query runs.
    pub fn decode(raw: &str) -> Result<Self, QueryError> {
        raw.trim()
            .parse::<u64>()
            .map(|key| Cursor(RecordKey(key)))
            .map_err(|_| QueryError::InvalidCursor {
                given: raw.to_string(),
            })
    }

    pub fn encode(&self) -> String {
        self.0 .0.to_string()
    }
}

/// One page of records plus the keyset state to fetch the next.
#[derive(Debug, Clone)]
pub struct Page {
    pub records: Vec<Address>,
    /// Record key of the last returned record, or `None` on an empty page.
    pub next_cursor: Option<String>,
    /// Exact-fill heuristic: true iff the page holds exactly `batch_size`
    /// records. May report true when nothing remains; accepted tradeoff.
    pub has_more: bool,
}

/// Fetch one page ordered ascending by record key, resuming after `cursor`.
pub async fn fetch_page<S: AddressStore>(
    store: &S,
    predicate: Predicate,
    batch_size: usize,
    cursor: Option<&str>,
) -> Result<Page, QueryError> {
    let batch_size = batch_size.max(1);

    let predicate = match cursor {
        Some(raw) => {
            let cursor = Cursor::decode(raw)?;
            Predicate::And(vec![predicate, Predicate::RecordKeyAfter(cursor.0)])
        }
        None => predicate,
    };

    let query = StoreQuery {
        predicate,
        order: Order::RecordKeyAsc,
        limit: Some(batch_size),
    };
    let records = store.fetch(QueryOp::Containment, &query).await?;

    let has_more = records.len() == batch_size;
    let next_cursor = records.last().map(|r| Cursor(r.record_key).encode());

    Ok(Page {
        records,
        next_cursor,
        has_more,
    })
}
