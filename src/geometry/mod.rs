//! Transient polygon geometry produced by the WKT parser.

pub mod wkt;

use geo_types::{Coord, LineString, MultiPolygon as GeoMultiPolygon, Polygon as GeoPolygon};

/// A ring of coordinates. Closed when first equals last; open rings are
/// passed through unchanged rather than rejected or repaired.
pub type Ring = Vec<Coord<f64>>;

/// Parsed polygon geometry.
///
/// Rings are kept as siblings in input order: hole rings are carried but not
/// distinguished from exterior rings.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Polygon(Vec<Ring>),
    MultiPolygon(Vec<Vec<Ring>>),
}

impl Geometry {
    /// Re-serialize to WKT, preserving ring and point order.
    pub fn to_wkt(&self) -> String {
        match self {
            Geometry::Polygon(rings) => format!("POLYGON({})", rings_to_wkt(rings)),
            Geometry::MultiPolygon(polygons) => {
                let parts: Vec<String> = polygons
                    .iter()
                    .map(|rings| format!("({})", rings_to_wkt(rings)))
                    .collect();
                format!("MULTIPOLYGON({})", parts.join(","))
            }
        }
    }

    /// Convert to a `geo` multipolygon for direct geometric tests.
    ///
    /// The first ring of each polygon becomes the exterior, the rest become
    /// holes. `geo` closes open rings on construction.
    pub fn to_geo(&self) -> GeoMultiPolygon<f64> {
        match self {
            Geometry::Polygon(rings) => GeoMultiPolygon::new(vec![rings_to_geo(rings)]),
            Geometry::MultiPolygon(polygons) => {
                GeoMultiPolygon::new(polygons.iter().map(|rings| rings_to_geo(rings)).collect())
            }
        }
    }
}

fn rings_to_wkt(rings: &[Ring]) -> String {
    let parts: Vec<String> = rings
        .iter()
        .map(|ring| {
            let points: Vec<String> = ring.iter().map(|c| format!("{} {}", c.x, c.y)).collect();
            format!("({})", points.join(","))
        })
        .collect();
    parts.join(",")
}

fn rings_to_geo(rings: &[Ring]) -> GeoPolygon<f64> {
    let mut iter = rings.iter();
    let exterior = LineString::from(iter.next().cloned().unwrap_or_default());
    let interiors = iter.map(|ring| LineString::from(ring.clone())).collect();
    GeoPolygon::new(exterior, interiors)
}
