//! Domain types for the stop catalog.
//!
//! Identifiers are validated at construction time, so code that receives
//! a `StopId` or `RoutePatternId` can trust it is not blank.

mod ids;
mod stop;

pub use ids::{InvalidRoutePatternId, InvalidStopId, RoutePatternId, StopId};
pub use stop::{RoutePattern, Stop, StopAttributes};
