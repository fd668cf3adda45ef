//! Typed query predicates.
//!
//! Query semantics live here as plain values; a separate translator lowers
//! them into the store's native query form. This keeps predicates
//! independently testable and the store wire format out of the core.

use crate::geometry::Geometry;
use crate::models::{AddressProperties, RecordKey};

/// Scalar address field a substring predicate can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Number,
    Street,
    Unit,
    City,
    District,
    Region,
    Postcode,
}

/// Fields consulted for free-text candidate retrieval and scoring.
pub const SEARCH_FIELDS: [Field; 4] = [Field::Street, Field::Number, Field::Postcode, Field::City];

impl Field {
    /// Document path of the field inside a persisted address record.
    pub fn path(self) -> &'static str {
        match self {
            Field::Number => "properties.number",
            Field::Street => "properties.street",
            Field::Unit => "properties.unit",
            Field::City => "properties.city",
            Field::District => "properties.district",
            Field::Region => "properties.region",
            Field::Postcode => "properties.postcode",
        }
    }

    /// Project the field's value out of a record.
    pub fn value_of(self, properties: &AddressProperties) -> &str {
        match self {
            Field::Number => &properties.number,
            Field::Street => &properties.street,
            Field::Unit => &properties.unit,
            Field::City => &properties.city,
            Field::District => &properties.district,
            Field::Region => &properties.region,
            Field::Postcode => &properties.postcode,
        }
    }
}

/// A store-agnostic query predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Case-insensitive substring match against one scalar field.
    Substring { field: Field, needle: String },
    /// Any branch matches.
    Or(Vec<Predicate>),
    /// Every branch matches.
    And(Vec<Predicate>),
    /// Address point lies within the polygon/multipolygon.
    WithinGeometry(Geometry),
    /// Address point lies within `max_distance_m` meters of the origin.
    NearPoint {
        lon: f64,
        lat: f64,
        max_distance_m: f64,
    },
    /// Keyset bound: record key strictly greater than the cursor's.
    RecordKeyAfter(RecordKey),
}

impl Predicate {
    /// Lowercased substring predicate.
    pub fn substring(field: Field, needle: impl Into<String>) -> Self {
        Predicate::Substring {
            field,
            needle: needle.into().to_lowercase(),
        }
    }

    /// AND the branches, collapsing a singleton.
    pub fn and(mut branches: Vec<Predicate>) -> Predicate {
        if branches.len() == 1 {
            branches.remove(0)
        } else {
            Predicate::And(branches)
        }
    }

    /// OR the branches, collapsing a singleton.
    pub fn or(mut branches: Vec<Predicate>) -> Predicate {
        if branches.len() == 1 {
            branches.remove(0)
        } else {
            Predicate::Or(branches)
        }
    }

    /// AND-combine, or `None` when nothing is active.
    pub fn all(branches: Vec<Predicate>) -> Option<Predicate> {
        if branches.is_empty() {
            None
        } else {
            Some(Predicate::and(branches))
        }
    }

    /// OR-combine, or `None` when nothing is active.
    pub fn any(branches: Vec<Predicate>) -> Option<Predicate> {
        if branches.is_empty() {
            None
        } else {
            Some(Predicate::or(branches))
        }
    }
}
