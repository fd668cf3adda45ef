//! Core data models for the address query engine.

use serde::{Deserialize, Serialize};

/// Store-assigned, totally ordered record identifier.
///
/// Only used for keyset pagination ordering; opaque to callers. The cursor
/// wire form encodes it in decimal.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RecordKey(pub u64);

/// Geographic point (lon/lat, WGS84)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lon: f64,
    pub lat: f64,
}

/// Scalar address components. All free text; may be empty, never absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddressProperties {
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub district: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub postcode: String,
}

/// Address record as persisted by the store. The query engine reads these,
/// never mutates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    /// Externally supplied stable identifier, unique per collection.
    pub id: String,
    /// Content fingerprint, also unique.
    pub hash: String,
    pub geometry: GeoPoint,
    pub properties: AddressProperties,
    /// Assigned by the store on insert.
    #[serde(default)]
    pub record_key: RecordKey,
}

impl Address {
    /// Create a record with the given identifiers and position. The store
    /// assigns the record key on insert.
    pub fn new(id: impl Into<String>, hash: impl Into<String>, lon: f64, lat: f64) -> Self {
        Self {
            id: id.into(),
            hash: hash.into(),
            geometry: GeoPoint { lon, lat },
            properties: AddressProperties::default(),
            record_key: RecordKey(0),
        }
    }

    pub fn with_street(mut self, street: &str) -> Self {
        self.properties.street = street.to_string();
        self
    }

    pub fn with_number(mut self, number: &str) -> Self {
        self.properties.number = number.to_string();
        self
    }

    pub fn with_city(mut self, city: &str) -> Self {
        self.properties.city = city.to_string();
        self
    }

    pub fn with_postcode(mut self, postcode: &str) -> Self {
        self.properties.postcode = postcode.to_string();
        self
    }

    /// GeoJSON rendering of this record.
    pub fn to_feature(&self) -> Feature {
        Feature {
            feature_type: "Feature".to_string(),
            geometry: FeatureGeometry {
                geo_type: "Point".to_string(),
                coordinates: [self.geometry.lon, self.geometry.lat],
            },
            properties: FeatureProperties {
                hash: self.hash.clone(),
                number: self.properties.number.clone(),
                street: self.properties.street.clone(),
                unit: self.properties.unit.clone(),
                city: self.properties.city.clone(),
                district: self.properties.district.clone(),
                region: self.properties.region.clone(),
                postcode: self.properties.postcode.clone(),
                id: self.id.clone(),
            },
        }
    }
}

/// A single GeoJSON feature returned to the transport layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub feature_type: String,
    pub geometry: FeatureGeometry,
    pub properties: FeatureProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureGeometry {
    #[serde(rename = "type")]
    pub geo_type: String,
    /// `[lon, lat]`
    pub coordinates: [f64; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureProperties {
    pub hash: String,
    pub number: String,
    pub street: String,
    pub unit: String,
    pub city: String,
    pub district: String,
    pub region: String,
    pub postcode: String,
    pub id: String,
}

/// An ordered GeoJSON feature collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub collection_type: String,
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn empty() -> Self {
        Self {
            collection_type: "FeatureCollection".to_string(),
            features: Vec::new(),
        }
    }

    pub fn from_addresses(records: &[Address]) -> Self {
        Self {
            collection_type: "FeatureCollection".to_string(),
            features: records.iter().map(Address::to_feature).collect(),
        }
    }
}

/// One page of containment results plus the keyset state for the next page.
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub geojson: FeatureCollection,
    pub next_cursor: Option<String>,
    pub has_more: bool,
}
