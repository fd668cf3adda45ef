//! Categorical filter normalization.
//!
//! Each optional field becomes a case-insensitive substring predicate;
//! multiple values for one field are OR'ed, active fields are AND'ed.

use serde::Deserialize;

use super::predicate::{Field, Predicate};

/// One or many values for a filter field. A single string may carry
/// comma-separated values.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    /// Normalize to trimmed, lowercased, non-empty items.
    fn items(&self) -> Vec<String> {
        let raw: Vec<&str> = match self {
            OneOrMany::One(s) => s.split(',').collect(),
            OneOrMany::Many(values) => values.iter().map(String::as_str).collect(),
        };
        raw.into_iter()
            .map(|v| v.trim().to_lowercase())
            .filter(|v| !v.is_empty())
            .collect()
    }
}

/// Optional categorical filters accepted alongside any request. An absent
/// or empty field contributes no predicate.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterInput {
    #[serde(default)]
    pub city: Option<OneOrMany>,
    #[serde(default)]
    pub street: Option<OneOrMany>,
    #[serde(default)]
    pub postcode: Option<OneOrMany>,
    #[serde(default)]
    pub district: Option<OneOrMany>,
    #[serde(default)]
    pub region: Option<OneOrMany>,
    /// Always single-valued: a substring match against the address number.
    #[serde(default)]
    pub number: Option<String>,
}

/// Build the AND-of-ORs predicate for the active fields, or `None` when no
/// filter is active.
pub fn build(input: &FilterInput) -> Option<Predicate> {
    let mut active = Vec::new();
    push_field(&mut active, Field::City, &input.city);
    push_field(&mut active, Field::Street, &input.street);
    push_field(&mut active, Field::Postcode, &input.postcode);
    push_field(&mut active, Field::District, &input.district);
    push_field(&mut active, Field::Region, &input.region);

    if let Some(number) = &input.number {
        let needle = number.trim().to_lowercase();
        if !needle.is_empty() {
            active.push(Predicate::Substring {
                field: Field::Number,
                needle,
            });
        }
    }

    Predicate::all(active)
}

fn push_field(active: &mut Vec<Predicate>, field: Field, value: &Option<OneOrMany>) {
    let Some(value) = value else {
        return;
    };
    let branches: Vec<Predicate> = value
        .items()
        .into_iter()
        .map(|needle| Predicate::Substring { field, needle })
        .collect();
    if let Some(pred) = Predicate::any(branches) {
        active.push(pred);
    }
}
