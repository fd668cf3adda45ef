//! WKT parsing for `POLYGON` and `MULTIPOLYGON` shapes.
//!
//! The parser accepts exactly the two shape kinds the store can filter on.
//! Hole rings are tolerated and returned as siblings of the exterior ring.
//! Ring closure is not validated: an open ring passes through unchanged.

use geo_types::Coord;
use thiserror::Error;

use super::{Geometry, Ring};

/// How much of the offending input to echo back in an error.
const FRAGMENT_LEN: usize = 48;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WktError {
    #[error("unsupported WKT shape near {0:?}, expected POLYGON or MULTIPOLYGON")]
    UnsupportedShape(String),
    #[error("unbalanced parentheses near {0:?}")]
    UnbalancedParens(String),
    #[error("stray text outside a ring near {0:?}")]
    MalformedRings(String),
    #[error("malformed coordinate pair {0:?}, expected two numbers")]
    BadCoordinatePair(String),
    #[error("non-numeric coordinate {0:?}")]
    BadNumber(String),
    #[error("empty geometry body")]
    Empty,
}

/// Parse a WKT string into structured geometry.
pub fn parse(input: &str) -> Result<Geometry, WktError> {
    let trimmed = input.trim();
    let upper = trimmed.to_ascii_uppercase();

    if upper.starts_with("MULTIPOLYGON") {
        let body = &trimmed["MULTIPOLYGON".len()..];
        parse_multipolygon(body).map(Geometry::MultiPolygon)
    } else if upper.starts_with("POLYGON") {
        let body = &trimmed["POLYGON".len()..];
        parse_polygon(body).map(Geometry::Polygon)
    } else {
        Err(WktError::UnsupportedShape(fragment(trimmed)))
    }
}

/// `((x y, x y, ...),(...))` → rings
fn parse_polygon(body: &str) -> Result<Vec<Ring>, WktError> {
    let inner = strip_outer(body)?;
    split_groups(inner)?
        .into_iter()
        .map(parse_ring)
        .collect()
}

/// `(((x y, ...)),((x y, ...)))` → polygons of rings
fn parse_multipolygon(body: &str) -> Result<Vec<Vec<Ring>>, WktError> {
    let inner = strip_outer(body)?;
    split_groups(inner)?
        .into_iter()
        .map(|chunk| {
            split_groups(chunk)?
                .into_iter()
                .map(parse_ring)
                .collect()
        })
        .collect()
}

/// Strip one matched level of parentheses around the whole body.
fn strip_outer(body: &str) -> Result<&str, WktError> {
    let body = body.trim();
    if body.is_empty() {
        return Err(WktError::Empty);
    }
    if !body.starts_with('(') || !body.ends_with(')') || !balanced(body) {
        return Err(WktError::UnbalancedParens(fragment(body)));
    }
    Ok(&body[1..body.len() - 1])
}

fn balanced(s: &str) -> bool {
    let mut depth = 0i64;
    for c in s.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

/// Split into the contents of each top-level `(...)` group. Commas and
/// whitespace between groups are separators; anything else is an error.
fn split_groups(s: &str) -> Result<Vec<&str>, WktError> {
    let mut groups = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;

    for (i, c) in s.char_indices() {
        match c {
            '(' => {
                if depth == 0 {
                    start = i + 1;
                }
                depth += 1;
            }
            ')' => {
                if depth == 0 {
                    return Err(WktError::UnbalancedParens(fragment(s)));
                }
                depth -= 1;
                if depth == 0 {
                    groups.push(&s[start..i]);
                }
            }
            ',' => {}
            c if c.is_whitespace() => {}
            _ => {
                if depth == 0 {
                    return Err(WktError::MalformedRings(fragment(&s[i..])));
                }
            }
        }
    }

    if depth != 0 {
        return Err(WktError::UnbalancedParens(fragment(s)));
    }
    if groups.is_empty() {
        return Err(WktError::Empty);
    }
    Ok(groups)
}

/// `x y, x y, ...` → coordinates. A non-numeric token is a hard failure.
fn parse_ring(text: &str) -> Result<Ring, WktError> {
    let mut ring = Ring::new();
    for pair in text.split(',') {
        let pair = pair.trim();
        let parts: Vec<&str> = pair.split_whitespace().collect();
        if parts.len() != 2 {
            return Err(WktError::BadCoordinatePair(pair.to_string()));
        }
        let x: f64 = parts[0]
            .parse()
            .map_err(|_| WktError::BadNumber(parts[0].to_string()))?;
        let y: f64 = parts[1]
            .parse()
            .map_err(|_| WktError::BadNumber(parts[1].to_string()))?;
        ring.push(Coord { x, y });
    }
    Ok(ring)
}

fn fragment(s: &str) -> String {
    s.chars().take(FRAGMENT_LEN).collect()
}
