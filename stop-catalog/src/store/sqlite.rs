//! SQLite-backed store.

use std::collections::HashSet;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use tracing::{debug, info};

use crate::domain::{RoutePattern, RoutePatternId, Stop, StopId};

use super::error::StoreError;
use super::stop_store::StopStore;

/// Default database location: a file in the current directory.
const DEFAULT_DATABASE_URL: &str = "sqlite://stops.db?mode=rwc";

/// Default pool size.
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// How long a connection waits for another writer before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const STOP_COLUMNS: &str = "SELECT id, name, latitude, longitude FROM stops";

/// Schema statements, applied in order by [`SqliteStore::migrate`].
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS stops (
        id TEXT PRIMARY KEY NOT NULL,
        name TEXT NOT NULL,
        latitude REAL NOT NULL,
        longitude REAL NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS route_patterns (
        id TEXT PRIMARY KEY NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS route_pattern_stops (
        route_pattern_id TEXT NOT NULL REFERENCES route_patterns(id),
        stop_id TEXT NOT NULL REFERENCES stops(id),
        PRIMARY KEY (route_pattern_id, stop_id)
    )",
];

/// Configuration for the SQLite store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// sqlx connection URL
    pub database_url: String,
    /// Maximum pooled connections
    pub max_connections: u32,
}

impl StoreConfig {
    /// Create a config for the given connection URL.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }

    /// Set the pool size.
    ///
    /// In-memory databases (`sqlite::memory:`) need exactly one connection,
    /// since each connection opens its own private database.
    pub fn with_max_connections(mut self, n: u32) -> Self {
        self.max_connections = n;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DATABASE_URL)
    }
}

/// Stop store over a SQLite connection pool.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open a pool for the configured database. Foreign keys are enforced,
    /// and a connection blocked by another writer waits [`BUSY_TIMEOUT`].
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(&config.database_url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        debug!(url = %config.database_url, "Connected to stop database");
        Ok(Self { pool })
    }

    /// Create the tables if they do not already exist.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("Stop database schema ready");
        Ok(())
    }

    /// Register a route pattern. Existing patterns are left as they are.
    ///
    /// Route patterns are owned by whatever loads route data; the
    /// repository only ever reads them.
    pub async fn insert_route_pattern(
        &self,
        id: &RoutePatternId,
    ) -> Result<RoutePattern, StoreError> {
        sqlx::query("INSERT INTO route_patterns (id) VALUES (?) ON CONFLICT(id) DO NOTHING")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(RoutePattern::new(id.clone()))
    }
}

fn stop_from_row(row: &SqliteRow) -> Result<Stop, StoreError> {
    let id: String = row.try_get("id")?;
    let id = StopId::parse(id).map_err(|e| StoreError::InvalidData {
        message: e.to_string(),
    })?;

    Ok(Stop {
        id,
        name: row.try_get("name")?,
        latitude: row.try_get("latitude")?,
        longitude: row.try_get("longitude")?,
    })
}

fn stop_id_from_row(row: &SqliteRow) -> Result<StopId, StoreError> {
    let id: String = row.try_get("stop_id")?;
    StopId::parse(id).map_err(|e| StoreError::InvalidData {
        message: e.to_string(),
    })
}

impl StopStore for SqliteStore {
    async fn find_all_stops(&self) -> Result<Vec<Stop>, StoreError> {
        let rows = sqlx::query(&format!("{STOP_COLUMNS} ORDER BY rowid"))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(stop_from_row).collect()
    }

    async fn find_stops_by_ids(&self, ids: &HashSet<StopId>) -> Result<Vec<Stop>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = QueryBuilder::<Sqlite>::new(STOP_COLUMNS);
        builder.push(" WHERE id IN (");
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(id.as_str().to_string());
        }
        separated.push_unseparated(")");

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(stop_from_row).collect()
    }

    async fn find_stop_by_id(&self, id: &StopId) -> Result<Option<Stop>, StoreError> {
        let row = sqlx::query(&format!("{STOP_COLUMNS} WHERE id = ?"))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(stop_from_row).transpose()
    }

    async fn find_or_create_stop(&self, stop: &Stop) -> Result<Stop, StoreError> {
        // Each statement takes the write lock on its own and waits out the
        // busy timeout; the stop row is never changed once inserted.
        let inserted = sqlx::query(
            "INSERT INTO stops (id, name, latitude, longitude) VALUES (?, ?, ?, ?)
             ON CONFLICT(id) DO NOTHING",
        )
        .bind(stop.id.as_str())
        .bind(stop.name.as_str())
        .bind(stop.latitude)
        .bind(stop.longitude)
        .execute(&self.pool)
        .await?
        .rows_affected();

        let row = sqlx::query(&format!(
            "{STOP_COLUMNS} WHERE id = ? AND name = ? AND latitude = ? AND longitude = ?"
        ))
        .bind(stop.id.as_str())
        .bind(stop.name.as_str())
        .bind(stop.latitude)
        .bind(stop.longitude)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                debug!(stop_id = %stop.id, inserted = inserted > 0, "Found or created stop");
                stop_from_row(&row)
            }
            None => Err(StoreError::Constraint {
                message: "UNIQUE constraint failed: stops.id".to_string(),
            }),
        }
    }

    async fn find_route_pattern_by_id(
        &self,
        id: &RoutePatternId,
    ) -> Result<Option<RoutePattern>, StoreError> {
        let row = sqlx::query("SELECT id FROM route_patterns WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|_| RoutePattern::new(id.clone())))
    }

    async fn add_route_pattern_stop(
        &self,
        route_pattern: &RoutePattern,
        stop: &Stop,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO route_pattern_stops (route_pattern_id, stop_id) VALUES (?, ?)
             ON CONFLICT(route_pattern_id, stop_id) DO NOTHING",
        )
        .bind(route_pattern.id.as_str())
        .bind(stop.id.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_route_pattern_stop_ids(
        &self,
        id: &RoutePatternId,
    ) -> Result<Vec<StopId>, StoreError> {
        let rows = sqlx::query(
            "SELECT stop_id FROM route_pattern_stops WHERE route_pattern_id = ? ORDER BY rowid",
        )
        .bind(id.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(stop_id_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn memory_store() -> SqliteStore {
        let config = StoreConfig::new("sqlite::memory:").with_max_connections(1);
        let store = SqliteStore::connect(&config).await.unwrap();
        store.migrate().await.unwrap();
        store
    }

    fn stop(id: &str, name: &str, lat: f64, lon: f64) -> Stop {
        Stop {
            id: StopId::parse(id).unwrap(),
            name: name.to_string(),
            latitude: lat,
            longitude: lon,
        }
    }

    fn pattern_id(s: &str) -> RoutePatternId {
        RoutePatternId::parse(s).unwrap()
    }

    #[test]
    fn config_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
    }

    #[tokio::test]
    async fn migrate_is_repeatable() {
        let store = memory_store().await;
        store.migrate().await.unwrap();
        assert!(store.find_all_stops().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn find_or_create_inserts_then_finds() {
        let store = memory_store().await;
        let main_st = stop("1234567", "Main St", 60.17, 24.94);

        let created = store.find_or_create_stop(&main_st).await.unwrap();
        assert_eq!(created, main_st);

        let found = store.find_or_create_stop(&main_st).await.unwrap();
        assert_eq!(found, main_st);

        let all = store.find_all_stops().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0], main_st);
    }

    #[tokio::test]
    async fn find_or_create_with_changed_attributes_fails() {
        let store = memory_store().await;
        store
            .find_or_create_stop(&stop("1234567", "Main St", 60.17, 24.94))
            .await
            .unwrap();

        let result = store
            .find_or_create_stop(&stop("1234567", "Main Street", 60.17, 24.94))
            .await;
        assert!(matches!(result, Err(StoreError::Constraint { .. })));

        let kept = store
            .find_stop_by_id(&StopId::parse("1234567").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(kept.name, "Main St");
    }

    #[tokio::test]
    async fn find_stop_by_id_missing_is_none() {
        let store = memory_store().await;
        let found = store
            .find_stop_by_id(&StopId::parse("nope").unwrap())
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn find_stops_by_ids_skips_unknown() {
        let store = memory_store().await;
        store
            .find_or_create_stop(&stop("A", "Alpha", 60.0, 24.0))
            .await
            .unwrap();
        store
            .find_or_create_stop(&stop("B", "Beta", 60.1, 24.1))
            .await
            .unwrap();

        let ids: HashSet<StopId> = ["A", "C"]
            .iter()
            .map(|s| StopId::parse(*s).unwrap())
            .collect();
        let found = store.find_stops_by_ids(&ids).await.unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id.as_str(), "A");

        let none = store.find_stops_by_ids(&HashSet::new()).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn route_pattern_links() {
        let store = memory_store().await;
        let pattern = store
            .insert_route_pattern(&pattern_id("HSL:1009:0:01"))
            .await
            .unwrap();
        let a = store
            .find_or_create_stop(&stop("A", "Alpha", 60.0, 24.0))
            .await
            .unwrap();

        assert!(
            store
                .find_route_pattern_by_id(&pattern_id("HSL:1009:0:01"))
                .await
                .unwrap()
                .is_some()
        );
        assert!(
            store
                .find_route_pattern_by_id(&pattern_id("HSL:9999:0:01"))
                .await
                .unwrap()
                .is_none()
        );

        store.add_route_pattern_stop(&pattern, &a).await.unwrap();
        store.add_route_pattern_stop(&pattern, &a).await.unwrap();

        let linked = store
            .find_route_pattern_stop_ids(&pattern.id)
            .await
            .unwrap();
        assert_eq!(linked, vec![a.id]);
    }

    #[tokio::test]
    async fn link_to_unknown_stop_violates_foreign_key() {
        let store = memory_store().await;
        let pattern = store
            .insert_route_pattern(&pattern_id("HSL:1009:0:01"))
            .await
            .unwrap();
        let ghost = stop("ghost", "Nowhere", 0.0, 0.0);

        let result = store.add_route_pattern_stop(&pattern, &ghost).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn file_database_persists_across_connections() {
        let dir = tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("stops.db").display());
        let config = StoreConfig::new(url);

        {
            let store = SqliteStore::connect(&config).await.unwrap();
            store.migrate().await.unwrap();
            store
                .find_or_create_stop(&stop("1234567", "Main St", 60.17, 24.94))
                .await
                .unwrap();
        }

        let reopened = SqliteStore::connect(&config).await.unwrap();
        let all = reopened.find_all_stops().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "Main St");
    }

    #[tokio::test]
    async fn concurrent_find_or_create_on_file_database() {
        let dir = tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("stops.db").display());
        let store = SqliteStore::connect(&StoreConfig::new(url)).await.unwrap();
        store.migrate().await.unwrap();

        for i in 0..20 {
            let candidate = stop(&format!("S{i}"), "Shared", 60.0, 24.0);
            let (a, b, c) = tokio::join!(
                store.find_or_create_stop(&candidate),
                store.find_or_create_stop(&candidate),
                store.find_or_create_stop(&candidate)
            );
            assert_eq!(a.unwrap(), candidate);
            assert_eq!(b.unwrap(), candidate);
            assert_eq!(c.unwrap(), candidate);
        }

        assert_eq!(store.find_all_stops().await.unwrap().len(), 20);
    }
}
