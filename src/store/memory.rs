//! In-memory address store for tests and local development.
//!
//! Predicates are evaluated by linear scan; containment goes through the
//! `geo` crate, proximity through a haversine distance. This is not a
//! spatial index and does not try to be one.

use async_trait::async_trait;
use geo::Contains;
use geo_types::Point;

use crate::models::{Address, RecordKey};
use crate::query::predicate::Predicate;

use super::{AddressStore, Order, QueryOp, StoreError, StoreQuery, DEFAULT_RESULT_CAP};

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Vec<Address>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, assigning the next record key in insert order.
    pub fn insert(&mut self, mut address: Address) -> RecordKey {
        let key = RecordKey(self.records.len() as u64 + 1);
        address.record_key = key;
        self.records.push(address);
        key
    }

    fn matches(address: &Address, predicate: &Predicate) -> bool {
        match predicate {
            Predicate::Substring { field, needle } => field
                .value_of(&address.properties)
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            Predicate::Or(branches) => branches.iter().any(|p| Self::matches(address, p)),
            Predicate::And(branches) => branches.iter().all(|p| Self::matches(address, p)),
            Predicate::WithinGeometry(geometry) => geometry
                .to_geo()
                .contains(&Point::new(address.geometry.lon, address.geometry.lat)),
            Predicate::NearPoint {
                lon,
                lat,
                max_distance_m,
            } => {
                haversine_distance(*lat, *lon, address.geometry.lat, address.geometry.lon)
                    <= *max_distance_m
            }
            Predicate::RecordKeyAfter(key) => address.record_key > *key,
        }
    }
}

/// Haversine distance between two points in meters.
fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

#[async_trait]
impl AddressStore for MemoryStore {
    async fn fetch(&self, _op: QueryOp, query: &StoreQuery) -> Result<Vec<Address>, StoreError> {
        let mut matched: Vec<Address> = self
            .records
            .iter()
            .filter(|address| Self::matches(address, &query.predicate))
            .cloned()
            .collect();

        match &query.order {
            Order::RecordKeyAsc => matched.sort_by_key(|a| a.record_key),
            Order::DistanceAsc { lon, lat } => {
                matched.sort_by(|a, b| {
                    let da = haversine_distance(*lat, *lon, a.geometry.lat, a.geometry.lon);
                    let db = haversine_distance(*lat, *lon, b.geometry.lat, b.geometry.lon);
                    da.total_cmp(&db)
                });
            }
        }

        matched.truncate(query.limit.unwrap_or(DEFAULT_RESULT_CAP));
        Ok(matched)
    }
}
