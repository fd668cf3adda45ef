//! Request orchestration.
//!
//! One pipeline per query kind: parse/validate, build predicates, fetch,
//! post-process (paginate or rank), render GeoJSON. The service holds no
//! state beyond the store handle; every request is independent.

use serde::Deserialize;
use tracing::debug;

use crate::error::QueryError;
use crate::geometry::wkt;
use crate::models::{BatchResult, FeatureCollection};
use crate::paginate::{self, DEFAULT_BATCH_SIZE};
use crate::query::{builder, filter, FilterInput};
use crate::rank;
use crate::store::{AddressStore, QueryOp};

/// Default result size for free-text search.
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Free-text search request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub limit: Option<usize>,
}

/// Containment search inside a WKT region, keyset-paged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContainmentRequest {
    pub region_wkt: String,
    pub limit: Option<usize>,
    pub batch_size: Option<usize>,
    pub cursor: Option<String>,
    #[serde(default)]
    pub filters: FilterInput,
}

/// Proximity search around a coordinate.
#[derive(Debug, Clone, Deserialize)]
pub struct ProximityRequest {
    /// `[lon, lat]`
    pub point: [f64; 2],
    /// Meters; defaults to 1000.
    pub max_distance: Option<f64>,
    #[serde(default)]
    pub filters: FilterInput,
}

/// The query engine facade the transport layer talks to.
pub struct AddressQueryService<S> {
    store: S,
}

impl<S: AddressStore> AddressQueryService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Fuzzy free-text search, best match first.
    pub async fn search(&self, request: &SearchRequest) -> Result<FeatureCollection, QueryError> {
        let limit = request.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
        let records = rank::search_ranked(&self.store, &request.query, limit).await?;
        debug!("search {:?}: {} results", request.query, records.len());
        Ok(FeatureCollection::from_addresses(&records))
    }

    /// One page of the addresses inside the region.
    pub async fn within(&self, request: &ContainmentRequest) -> Result<BatchResult, QueryError> {
        let geometry = wkt::parse(&request.region_wkt)?;
        let predicate = builder::containment(geometry, filter::build(&request.filters));
        let batch_size = request
            .batch_size
            .or(request.limit)
            .unwrap_or(DEFAULT_BATCH_SIZE);

        let page =
            paginate::fetch_page(&self.store, predicate, batch_size, request.cursor.as_deref())
                .await?;
        debug!(
            "containment page: {} records, has_more={}",
            page.records.len(),
            page.has_more
        );

        Ok(BatchResult {
            geojson: FeatureCollection::from_addresses(&page.records),
            next_cursor: page.next_cursor,
            has_more: page.has_more,
        })
    }

    /// Addresses within `max_distance` meters of the point, nearest first.
    pub async fn near(&self, request: &ProximityRequest) -> Result<FeatureCollection, QueryError> {
        let query = builder::proximity(
            request.point,
            request.max_distance,
            filter::build(&request.filters),
        )?;
        let records = self.store.fetch(QueryOp::Proximity, &query).await?;
        debug!("proximity: {} results", records.len());
        Ok(FeatureCollection::from_addresses(&records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::models::Address;
    use crate::query::filter::OneOrMany;
    use crate::query::predicate::Predicate;
    use crate::store::{MemoryStore, Order, StoreError, StoreQuery};

    /// Records every fetch and returns nothing.
    #[derive(Default)]
    struct RecordingStore {
        calls: Mutex<Vec<(QueryOp, StoreQuery)>>,
    }

    impl RecordingStore {
        fn calls(&self) -> Vec<(QueryOp, StoreQuery)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AddressStore for RecordingStore {
        async fn fetch(
            &self,
            op: QueryOp,
            query: &StoreQuery,
        ) -> Result<Vec<Address>, StoreError> {
            self.calls.lock().unwrap().push((op, query.clone()));
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn empty_search_returns_empty_collection_without_fetching() {
        let service = AddressQueryService::new(RecordingStore::default());
        let result = service
            .search(&SearchRequest {
                query: "   ".to_string(),
                limit: None,
            })
            .await
            .unwrap();

        assert_eq!(result, FeatureCollection::empty());
        assert!(service.store.calls().is_empty());
    }

    #[tokio::test]
    async fn containment_defaults_batch_size_to_500() {
        let service = AddressQueryService::new(RecordingStore::default());
        let request = ContainmentRequest {
            region_wkt: "POLYGON((0 0, 1 0, 1 1, 0 1, 0 0))".to_string(),
            ..Default::default()
        };
        let result = service.within(&request).await.unwrap();
        assert_eq!(result.next_cursor, None);
        assert!(!result.has_more);

        let calls = service.store.calls();
        assert_eq!(calls.len(), 1);
        let (op, query) = &calls[0];
        assert_eq!(*op, QueryOp::Containment);
        assert_eq!(query.limit, Some(500));
        assert_eq!(query.order, Order::RecordKeyAsc);
        assert!(matches!(query.predicate, Predicate::WithinGeometry(_)));
    }

    #[tokio::test]
    async fn containment_limit_stands_in_for_batch_size() {
        let service = AddressQueryService::new(RecordingStore::default());
        let request = ContainmentRequest {
            region_wkt: "POLYGON((0 0, 1 0, 1 1, 0 1, 0 0))".to_string(),
            limit: Some(25),
            ..Default::default()
        };
        service.within(&request).await.unwrap();
        assert_eq!(service.store.calls()[0].1.limit, Some(25));
    }

    #[tokio::test]
    async fn containment_cursor_adds_a_record_key_bound() {
        let service = AddressQueryService::new(RecordingStore::default());
        let request = ContainmentRequest {
            region_wkt: "POLYGON((0 0, 1 0, 1 1, 0 1, 0 0))".to_string(),
            cursor: Some("12".to_string()),
            ..Default::default()
        };
        service.within(&request).await.unwrap();

        let calls = service.store.calls();
        let Predicate::And(branches) = &calls[0].1.predicate else {
            panic!("expected AND of containment and cursor bound");
        };
        assert!(matches!(
            branches[1],
            Predicate::RecordKeyAfter(crate::models::RecordKey(12))
        ));
    }

    #[tokio::test]
    async fn containment_rejects_bad_wkt_and_bad_cursor() {
        let service = AddressQueryService::new(RecordingStore::default());

        let err = service
            .within(&ContainmentRequest {
                region_wkt: "CIRCLE(0 0, 5)".to_string(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::GeometryParse(_)));

        let err = service
            .within(&ContainmentRequest {
                region_wkt: "POLYGON((0 0, 1 0, 1 1, 0 1, 0 0))".to_string(),
                cursor: Some("zzz".to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidCursor { .. }));
        assert!(service.store.calls().is_empty());
    }

    #[tokio::test]
    async fn proximity_defaults_and_filters_flow_through() {
        let service = AddressQueryService::new(RecordingStore::default());
        let request = ProximityRequest {
            point: [6.8636568, 53.3246772],
            max_distance: None,
            filters: FilterInput {
                city: Some(OneOrMany::Many(vec!["Amsterdam".to_string()])),
                ..Default::default()
            },
        };
        service.near(&request).await.unwrap();

        let calls = service.store.calls();
        let (op, query) = &calls[0];
        assert_eq!(*op, QueryOp::Proximity);
        assert_eq!(query.limit, None);
        let Predicate::And(branches) = &query.predicate else {
            panic!("expected AND of distance and filter");
        };
        assert_eq!(
            branches[0],
            Predicate::NearPoint {
                lon: 6.8636568,
                lat: 53.3246772,
                max_distance_m: 1000.0
            }
        );
    }

    #[tokio::test]
    async fn proximity_scenario_respects_distance_and_city_filter() {
        let mut store = MemoryStore::new();
        // ~556 m north of the origin
        store.insert(
            Address::new("in-ams", "h1", 6.8636568, 53.3296772).with_city("Amsterdam"),
        );
        // Same distance, wrong city
        store.insert(
            Address::new("in-rot", "h2", 6.8636568, 53.3296772).with_city("Rotterdam"),
        );
        // ~2225 m north, right city
        store.insert(
            Address::new("out-ams", "h3", 6.8636568, 53.3446772).with_city("Amsterdam"),
        );

        let service = AddressQueryService::new(store);
        let result = service
            .near(&ProximityRequest {
                point: [6.8636568, 53.3246772],
                max_distance: Some(1500.0),
                filters: FilterInput {
                    city: Some(OneOrMany::One("Amsterdam".to_string())),
                    ..Default::default()
                },
            })
            .await
            .unwrap();

        assert_eq!(result.features.len(), 1);
        assert_eq!(result.features[0].properties.id, "in-ams");
    }

    #[tokio::test]
    async fn identical_searches_return_identical_results() {
        let mut store = MemoryStore::new();
        for i in 0..5 {
            store.insert(
                Address::new(format!("a/{i}"), format!("h{i}"), 0.0, 0.0)
                    .with_street("Middenweg")
                    .with_number(&i.to_string()),
            );
        }
        let service = AddressQueryService::new(store);
        let request = SearchRequest {
            query: "Middenweg".to_string(),
            limit: Some(3),
        };

        let first = service.search(&request).await.unwrap();
        let second = service.search(&request).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.features.len(), 3);
    }
}
