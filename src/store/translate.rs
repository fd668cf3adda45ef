//! Lowers typed predicates into Elasticsearch query DSL.

use serde_json::{json, Value};

use crate::geometry::{Geometry, Ring};
use crate::query::predicate::Predicate;

use super::{Order, StoreQuery, DEFAULT_RESULT_CAP};

/// Lower one predicate into an Elasticsearch query clause.
pub fn predicate_to_es(predicate: &Predicate) -> Value {
    match predicate {
        Predicate::Substring { field, needle } => json!({
            "wildcard": {
                (field.path()): {
                    "value": format!("*{}*", escape_wildcard(needle)),
                    "case_insensitive": true
                }
            }
        }),
        Predicate::Or(branches) => json!({
            "bool": {
                "should": branches.iter().map(predicate_to_es).collect::<Vec<_>>(),
                "minimum_should_match": 1
            }
        }),
        Predicate::And(branches) => json!({
            "bool": {
                "filter": branches.iter().map(predicate_to_es).collect::<Vec<_>>()
            }
        }),
        Predicate::WithinGeometry(geometry) => json!({
            "geo_shape": {
                "geometry": {
                    "shape": geometry_to_geojson(geometry),
                    "relation": "intersects"
                }
            }
        }),
        Predicate::NearPoint {
            lon,
            lat,
            max_distance_m,
        } => json!({
            "geo_distance": {
                "distance": format!("{max_distance_m}m"),
                "geometry": { "lat": lat, "lon": lon }
            }
        }),
        Predicate::RecordKeyAfter(key) => json!({
            "range": { "record_key": { "gt": key.0 } }
        }),
    }
}

/// Full search body for one store query.
pub fn query_to_es_body(query: &StoreQuery) -> Value {
    let sort = match &query.order {
        Order::RecordKeyAsc => json!([{ "record_key": "asc" }]),
        Order::DistanceAsc { lon, lat } => json!([{
            "_geo_distance": {
                "geometry": { "lat": lat, "lon": lon },
                "order": "asc",
                "unit": "m"
            }
        }]),
    };

    json!({
        "query": { "bool": { "filter": [predicate_to_es(&query.predicate)] } },
        "sort": sort,
        "size": query.limit.unwrap_or(DEFAULT_RESULT_CAP)
    })
}

/// GeoJSON geometry object for a geo_shape clause.
pub fn geometry_to_geojson(geometry: &Geometry) -> Value {
    match geometry {
        Geometry::Polygon(rings) => json!({
            "type": "Polygon",
            "coordinates": rings_to_coords(rings)
        }),
        Geometry::MultiPolygon(polygons) => json!({
            "type": "MultiPolygon",
            "coordinates": polygons.iter().map(|rings| rings_to_coords(rings)).collect::<Vec<_>>()
        }),
    }
}

fn rings_to_coords(rings: &[Ring]) -> Value {
    Value::Array(
        rings
            .iter()
            .map(|ring| Value::Array(ring.iter().map(|c| json!([c.x, c.y])).collect()))
            .collect(),
    )
}

/// Escape the wildcard metacharacters in a literal needle.
fn escape_wildcard(needle: &str) -> String {
    needle
        .replace('\\', "\\\\")
        .replace('*', "\\*")
        .replace('?', "\\?")
}
