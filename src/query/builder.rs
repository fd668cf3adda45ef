//! Store query construction for spatial requests.

use crate::error::QueryError;
use crate::geometry::Geometry;
use crate::query::predicate::Predicate;
use crate::store::{Order, StoreQuery};

/// Meters within which a proximity search matches when unspecified.
pub const DEFAULT_MAX_DISTANCE_M: f64 = 1000.0;

/// Containment predicate: inside the geometry, AND any active filters.
/// The cursor bound, when paging, is injected by the paginator.
pub fn containment(geometry: Geometry, filters: Option<Predicate>) -> Predicate {
    let mut branches = vec![Predicate::WithinGeometry(geometry)];
    if let Some(filters) = filters {
        branches.push(filters);
    }
    Predicate::and(branches)
}

/// Proximity query: within `max_distance` meters of the point, ordered by
/// increasing distance. Unpaged; bounded only by the store's result cap.
pub fn proximity(
    point: [f64; 2],
    max_distance: Option<f64>,
    filters: Option<Predicate>,
) -> Result<StoreQuery, QueryError> {
    let [lon, lat] = point;
    if !lon.is_finite() || !lat.is_finite() {
        return Err(QueryError::Validation(format!(
            "proximity point coordinates must be finite, got [{lon}, {lat}]"
        )));
    }
    let max_distance_m = max_distance.unwrap_or(DEFAULT_MAX_DISTANCE_M);
    if !max_distance_m.is_finite() || max_distance_m <= 0.0 {
        return Err(QueryError::Validation(format!(
            "max distance must be a positive number of meters, got {max_distance_m}"
        )));
    }

    let mut branches = vec![Predicate::NearPoint {
        lon,
        lat,
        max_distance_m,
    }];
    if let Some(filters) = filters {
        branches.push(filters);
    }

    Ok(StoreQuery {
        predicate: Predicate::and(branches),
        order: Order::DistanceAsc { lon, lat },
        limit: None,
    })
}
