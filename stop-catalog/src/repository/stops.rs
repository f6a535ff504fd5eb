//! Stop repository.
//!
//! Resolves stops from the local store, materializes them from upstream on
//! first reference, and links them to route patterns.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::domain::{RoutePatternId, Stop, StopId};
use crate::store::StopStore;
use crate::upstream::{RequestPriority, StopSource};

use super::error::{AssociateFailure, CreateStopFailure, RepositoryError, SaveStopError};

/// Orchestrates the stop store and the upstream stop source.
///
/// Holds no state of its own: all shared mutable state lives in the store,
/// so a repository can be cloned or shared freely. Nothing is retried;
/// every failure is surfaced once.
#[derive(Debug, Clone)]
pub struct StopRepository<U, S> {
    upstream: U,
    store: S,
}

impl<U: StopSource, S: StopStore> StopRepository<U, S> {
    pub fn new(upstream: U, store: S) -> Self {
        Self { upstream, store }
    }

    /// Access the underlying upstream source.
    pub fn upstream(&self) -> &U {
        &self.upstream
    }

    /// Access the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// All stops, in store-native order.
    pub async fn list(&self) -> Result<Vec<Stop>, RepositoryError> {
        Ok(self.store.find_all_stops().await?)
    }

    /// Stops whose ID is in `ids`. IDs not in the store are silently
    /// omitted; order is not guaranteed.
    pub async fn list_by_ids(&self, ids: &HashSet<StopId>) -> Result<Vec<Stop>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.store.find_stops_by_ids(ids).await?)
    }

    /// Look up one stop.
    ///
    /// Returns [`RepositoryError::NoSuchStop`] if it is not in the store;
    /// callers that want the stop regardless can fall back to
    /// [`create_by_id`](Self::create_by_id).
    pub async fn get_by_id(&self, stop_id: &StopId) -> Result<Stop, RepositoryError> {
        debug!(stop_id = %stop_id, "Looking up stop");

        self.store
            .find_stop_by_id(stop_id)
            .await?
            .ok_or_else(|| RepositoryError::NoSuchStop {
                stop_id: stop_id.to_string(),
            })
    }

    /// Materialize a stop locally from its upstream record.
    ///
    /// Issues exactly one high-priority upstream query, then a
    /// find-or-create keyed on the ID *and* the fetched attributes. Calling
    /// this twice with unchanged upstream data returns the same record
    /// without duplicating it. If upstream data changed since the stop was
    /// created, the new attributes do not match the stored row and the
    /// insert is rejected by the store.
    ///
    /// Every failure becomes [`RepositoryError::CouldNotSaveStop`]. When the
    /// upstream query fails, nothing is written.
    pub async fn create_by_id(&self, stop_id: &StopId) -> Result<Stop, RepositoryError> {
        let fail = |cause: CreateStopFailure| {
            let err = SaveStopError::Create {
                stop_id: stop_id.to_string(),
                cause,
            };
            warn!(stop_id = %stop_id, error = %err, "Could not save stop");
            RepositoryError::from(err)
        };

        let attributes = self
            .upstream
            .fetch_stop(stop_id, RequestPriority::High)
            .await
            .map_err(|e| fail(CreateStopFailure::UpstreamFetch(e)))?;

        let candidate = Stop::new(stop_id.clone(), attributes);
        let stop = self
            .store
            .find_or_create_stop(&candidate)
            .await
            .map_err(|e| fail(CreateStopFailure::StoreWrite(e)))?;

        info!(stop_id = %stop.id, name = %stop.name, "Stop saved");
        Ok(stop)
    }

    /// Link a stop to a route pattern. Both must already exist.
    ///
    /// The two lookups run concurrently and are both awaited before either
    /// result is inspected. A missing stop is reported in preference to a
    /// missing route pattern. Missing endpoints and a rejected link write
    /// become [`RepositoryError::CouldNotSaveStop`]; a failed lookup is
    /// returned as [`RepositoryError::Store`].
    pub async fn associate_to_route_pattern(
        &self,
        stop_id: &StopId,
        route_pattern_id: &RoutePatternId,
    ) -> Result<(), RepositoryError> {
        let fail = |cause: AssociateFailure| {
            let err = SaveStopError::Associate {
                stop_id: stop_id.to_string(),
                route_pattern_id: route_pattern_id.to_string(),
                cause,
            };
            warn!(
                stop_id = %stop_id,
                route_pattern_id = %route_pattern_id,
                error = %err,
                "Could not associate stop"
            );
            RepositoryError::from(err)
        };

        let (stop, route_pattern) = tokio::join!(
            self.store.find_stop_by_id(stop_id),
            self.store.find_route_pattern_by_id(route_pattern_id)
        );

        let stop = stop?.ok_or_else(|| fail(AssociateFailure::StopNotFound))?;
        let route_pattern =
            route_pattern?.ok_or_else(|| fail(AssociateFailure::RoutePatternNotFound))?;

        self.store
            .add_route_pattern_stop(&route_pattern, &stop)
            .await
            .map_err(|e| fail(AssociateFailure::StoreWrite(e)))?;

        info!(
            stop_id = %stop_id,
            route_pattern_id = %route_pattern_id,
            "Stop associated to route pattern"
        );
        Ok(())
    }
}
