//! Stop and route pattern records.

use serde::Serialize;

use super::{RoutePatternId, StopId};

/// Canonical stop attributes as published by the upstream source.
///
/// This is the upstream record translated to local field names; it carries
/// no identifier because the caller already holds one.
#[derive(Debug, Clone, PartialEq)]
pub struct StopAttributes {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// A physical transit stop held in the local catalog.
///
/// Stops are created once, on first reference, and never mutated by this
/// crate afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stop {
    pub id: StopId,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Stop {
    /// Build a stop record from an identifier and its upstream attributes.
    pub fn new(id: StopId, attributes: StopAttributes) -> Self {
        Self {
            id,
            name: attributes.name,
            latitude: attributes.latitude,
            longitude: attributes.longitude,
        }
    }
}

/// A directional variant of a route.
///
/// Opaque here: only its identifier is known, and it is never created by
/// the repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RoutePattern {
    pub id: RoutePatternId,
}

impl RoutePattern {
    pub fn new(id: RoutePatternId) -> Self {
        Self { id }
    }
}
