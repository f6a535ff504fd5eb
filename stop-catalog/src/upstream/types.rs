//! GraphQL request and response DTOs.
//!
//! These types map directly to the Digitransit routing API. Only the
//! handful of stop fields the catalog stores are requested.

use serde::{Deserialize, Serialize};

use crate::domain::StopAttributes;

/// Query for a single stop's name and coordinates.
pub const STOP_QUERY: &str = "query StopById($id: String!) { stop(id: $id) { name lat lon } }";

/// A GraphQL request body.
#[derive(Debug, Serialize)]
pub struct GraphQlRequest<'a> {
    pub query: &'a str,
    pub variables: StopVariables<'a>,
}

/// Variables for [`STOP_QUERY`].
#[derive(Debug, Serialize)]
pub struct StopVariables<'a> {
    pub id: &'a str,
}

/// A GraphQL response envelope.
///
/// GraphQL servers may return partial `data` alongside `errors`, so both
/// are optional.
#[derive(Debug, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlErrorDto>,
}

/// One entry in a GraphQL `errors` array.
#[derive(Debug, Deserialize)]
pub struct GraphQlErrorDto {
    pub message: String,
}

/// `data` payload for [`STOP_QUERY`]. `stop` is null for unknown IDs.
#[derive(Debug, Deserialize)]
pub struct StopData {
    pub stop: Option<StopDto>,
}

/// Raw stop fields as the upstream names them.
#[derive(Debug, Clone, Deserialize)]
pub struct StopDto {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

impl From<StopDto> for StopAttributes {
    fn from(dto: StopDto) -> Self {
        StopAttributes {
            name: dto.name,
            latitude: dto.lat,
            longitude: dto.lon,
        }
    }
}
