//! In-process store.
//!
//! Mirrors the SQLite store's semantics (unique stop IDs, foreign keys on
//! links, duplicate links ignored) without a database. Useful for embedding
//! the repository where persistence is not wanted, and for tests.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::domain::{RoutePattern, RoutePatternId, Stop, StopId};

use super::error::StoreError;
use super::stop_store::StopStore;

#[derive(Debug, Default)]
struct Tables {
    /// Stops in insertion order.
    stops: Vec<Stop>,
    route_patterns: Vec<RoutePattern>,
    /// (route pattern, stop) links in insertion order.
    links: Vec<(RoutePatternId, StopId)>,
}

/// Thread-safe in-memory stop store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route pattern. Existing patterns are left as they are.
    pub async fn insert_route_pattern(&self, id: &RoutePatternId) -> RoutePattern {
        let mut tables = self.inner.write().await;
        if !tables.route_patterns.iter().any(|p| &p.id == id) {
            tables.route_patterns.push(RoutePattern::new(id.clone()));
        }
        RoutePattern::new(id.clone())
    }
}

impl StopStore for MemoryStore {
    async fn find_all_stops(&self) -> Result<Vec<Stop>, StoreError> {
        let tables = self.inner.read().await;
        Ok(tables.stops.clone())
    }

    async fn find_stops_by_ids(&self, ids: &HashSet<StopId>) -> Result<Vec<Stop>, StoreError> {
        let tables = self.inner.read().await;
        Ok(tables
            .stops
            .iter()
            .filter(|s| ids.contains(&s.id))
            .cloned()
            .collect())
    }

    async fn find_stop_by_id(&self, id: &StopId) -> Result<Option<Stop>, StoreError> {
        let tables = self.inner.read().await;
        Ok(tables.stops.iter().find(|s| &s.id == id).cloned())
    }

    async fn find_or_create_stop(&self, stop: &Stop) -> Result<Stop, StoreError> {
        let mut tables = self.inner.write().await;

        if let Some(existing) = tables.stops.iter().find(|s| s.id == stop.id) {
            if existing == stop {
                return Ok(existing.clone());
            }
            return Err(StoreError::Constraint {
                message: "UNIQUE constraint failed: stops.id".to_string(),
            });
        }

        tables.stops.push(stop.clone());
        Ok(stop.clone())
    }

    async fn find_route_pattern_by_id(
        &self,
        id: &RoutePatternId,
    ) -> Result<Option<RoutePattern>, StoreError> {
        let tables = self.inner.read().await;
        Ok(tables.route_patterns.iter().find(|p| &p.id == id).cloned())
    }

    async fn add_route_pattern_stop(
        &self,
        route_pattern: &RoutePattern,
        stop: &Stop,
    ) -> Result<(), StoreError> {
        let mut tables = self.inner.write().await;

        let pattern_known = tables.route_patterns.iter().any(|p| p.id == route_pattern.id);
        let stop_known = tables.stops.iter().any(|s| s.id == stop.id);
        if !pattern_known || !stop_known {
            return Err(StoreError::Constraint {
                message: "FOREIGN KEY constraint failed".to_string(),
            });
        }

        let link = (route_pattern.id.clone(), stop.id.clone());
        if !tables.links.contains(&link) {
            tables.links.push(link);
        }
        Ok(())
    }

    async fn find_route_pattern_stop_ids(
        &self,
        id: &RoutePatternId,
    ) -> Result<Vec<StopId>, StoreError> {
        let tables = self.inner.read().await;
        Ok(tables
            .links
            .iter()
            .filter(|(pattern, _)| pattern == id)
            .map(|(_, stop)| stop.clone())
            .collect())
    }
}
