//! Local catalog of transit stops.
//!
//! Stops are resolved from a local store and, on first reference, fetched
//! from the upstream transit-data service and persisted. Stops can then be
//! linked to the route patterns that serve them.

pub mod config;
pub mod domain;
pub mod repository;
pub mod store;
pub mod upstream;
