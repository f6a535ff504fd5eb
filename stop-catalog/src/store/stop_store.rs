//! The persistent store abstraction.

use std::collections::HashSet;
use std::future::Future;

use crate::domain::{RoutePattern, RoutePatternId, Stop, StopId};

use super::error::StoreError;

/// Relational storage for stops, route patterns and the link between them.
///
/// Every operation may fail with a [`StoreError`] on connectivity or
/// constraint problems. Concurrency control (transactions, uniqueness) is
/// the implementation's responsibility.
pub trait StopStore {
    /// All stops, in store-native order.
    fn find_all_stops(&self) -> impl Future<Output = Result<Vec<Stop>, StoreError>> + Send;

    /// Stops whose ID is in `ids`. Unknown IDs are skipped.
    fn find_stops_by_ids(
        &self,
        ids: &HashSet<StopId>,
    ) -> impl Future<Output = Result<Vec<Stop>, StoreError>> + Send;

    /// One stop by ID, or `None` if absent.
    fn find_stop_by_id(
        &self,
        id: &StopId,
    ) -> impl Future<Output = Result<Option<Stop>, StoreError>> + Send;

    /// Return the stored row matching every field of `stop`, inserting
    /// `stop` if there is none.
    ///
    /// The match covers the full attribute tuple, not just the ID. A stop
    /// whose ID exists with different attributes is therefore an insert
    /// that violates the primary key and fails with
    /// [`StoreError::Constraint`].
    fn find_or_create_stop(
        &self,
        stop: &Stop,
    ) -> impl Future<Output = Result<Stop, StoreError>> + Send;

    /// One route pattern by ID, or `None` if absent.
    fn find_route_pattern_by_id(
        &self,
        id: &RoutePatternId,
    ) -> impl Future<Output = Result<Option<RoutePattern>, StoreError>> + Send;

    /// Link a stop to a route pattern. Re-adding an existing link is a no-op.
    fn add_route_pattern_stop(
        &self,
        route_pattern: &RoutePattern,
        stop: &Stop,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// IDs of the stops linked to a route pattern.
    fn find_route_pattern_stop_ids(
        &self,
        id: &RoutePatternId,
    ) -> impl Future<Output = Result<Vec<StopId>, StoreError>> + Send;
}
