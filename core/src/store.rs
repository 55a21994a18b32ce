//! Async facade over the pooled NEO store
//!
//! Each call checks one connection out of the pool for its duration. Reads
//! are not wrapped in transactions.

use std::path::Path;

use crate::config::NeoConfig;
use crate::db::{self, DbPool, TableCounts, with_connection};
use crate::errors::Result;
use crate::feed::FeedResponse;
use crate::ingest::{IngestCounts, ingest_feed};
use crate::normalize::{self, NormalizedAsteroid};

/// Handle to the SQLite store. Cheap to clone.
#[derive(Clone)]
pub struct AsteroidStore {
    pool: DbPool,
}

impl AsteroidStore {
    /// Open the store configured in `cfg`, creating file and schema if needed
    pub fn open(cfg: &NeoConfig) -> Result<Self> {
        Self::open_at_path(&cfg.resolved_db_path(), cfg.pool_size)
    }

    pub fn open_at_path(path: &Path, pool_size: u32) -> Result<Self> {
        let pool = db::initialize_pool(path, pool_size)?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// One normalized asteroid, `None` if not stored
    pub async fn asteroid(&self, id: &str) -> Result<Option<NormalizedAsteroid>> {
        let id = id.to_string();
        with_connection(&self.pool, move |conn| normalize::normalize_asteroid(conn, &id)).await
    }

    /// Every stored asteroid, normalized
    pub async fn asteroids(&self) -> Result<Vec<NormalizedAsteroid>> {
        with_connection(&self.pool, |conn| normalize::normalize_all(conn)).await
    }

    /// Normalize `ids`, skipping those that are not stored
    pub async fn asteroids_by_ids(&self, ids: Vec<String>) -> Result<Vec<NormalizedAsteroid>> {
        with_connection(&self.pool, move |conn| normalize::normalize_many(conn, &ids)).await
    }

    pub async fn asteroid_ids(&self) -> Result<Vec<String>> {
        with_connection(&self.pool, |conn| normalize::list_asteroid_ids(conn)).await
    }

    /// Write a decoded feed response
    pub async fn ingest(&self, feed: FeedResponse) -> Result<IngestCounts> {
        with_connection(&self.pool, move |conn| ingest_feed(conn, &feed)).await
    }

    pub async fn counts(&self) -> Result<TableCounts> {
        with_connection(&self.pool, |conn| db::table_counts(conn)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_ingest_then_read_back() {
        let dir = TempDir::new().expect("tempdir");
        let store = AsteroidStore::open_at_path(&dir.path().join("asteroids.db"), 2).expect("open");

        let feed = FeedResponse::from_value(&json!({"near_earth_objects": {"2024-01-02": [{
            "neo_reference_id": "3542519",
            "name": "(2010 PK9)",
            "nasa_jpl_url": "https://ssd.jpl.nasa.gov/?sstr=3542519",
            "absolute_magnitude_h": 21.9,
            "is_potentially_hazardous_asteroid": true
        }]}}))
        .expect("feed");

        let counts = store.ingest(feed).await.expect("ingest");
        assert_eq!(counts.asteroids, 1);

        assert_eq!(store.asteroid_ids().await.expect("ids"), vec!["3542519"]);
        let asteroid = store
            .asteroid("3542519")
            .await
            .expect("read")
            .expect("present");
        assert_eq!(asteroid.name.as_deref(), Some("(2010 PK9)"));
        assert!(store.asteroid("nope").await.expect("read").is_none());
        assert_eq!(store.asteroids().await.expect("all").len(), 1);
        assert_eq!(store.counts().await.expect("counts").asteroids, 1);
    }

    #[tokio::test]
    async fn test_reopen_keeps_data() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("asteroids.db");
        {
            let store = AsteroidStore::open_at_path(&path, 1).expect("open");
            with_connection(store.pool(), |conn| {
                conn.execute(
                    "INSERT INTO asteroids (neo_reference_id, name) VALUES ('1', 'one')",
                    [],
                )?;
                Ok(())
            })
            .await
            .expect("insert");
        }

        let reopened = AsteroidStore::open_at_path(&path, 1).expect("reopen");
        assert_eq!(reopened.counts().await.expect("counts").asteroids, 1);
    }
}
