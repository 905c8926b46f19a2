use std::sync::Arc;

use chrono::Utc;
use rusqlite::OptionalExtension;
use tracing::{debug, warn};

use super::errors::StorageError;
use super::in_memory::InMemoryStore;
use super::store::KeyValueStore;
use crate::database::{open_pool, SqlitePool, StoreConfig};

/// Key-value store backed by the `local_storage` table
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Wrap an existing pool; the schema must already exist
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (or create) the store described by `config`
    pub fn open(config: &StoreConfig) -> Result<Self, StorageError> {
        Ok(Self::new(open_pool(config)?))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let conn = self.pool.get()?;
        let value = conn
            .query_row(
                "SELECT value FROM local_storage WHERE key = ?1",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        debug!("Persisting session key: {}", key);
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO local_storage (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            rusqlite::params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        debug!("Removing session key: {}", key);
        let conn = self.pool.get()?;
        conn.execute("DELETE FROM local_storage WHERE key = ?1", [key])?;
        Ok(())
    }
}

/// Open the session store for `config`.
///
/// Never fails: if even the in-memory SQLite fallback cannot be set up, a plain
/// in-memory store is returned and the session lasts only for this run.
pub fn open_session_store(config: &StoreConfig) -> Arc<dyn KeyValueStore> {
    match SqliteStore::open(config) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            warn!("Session store unavailable ({}), keeping the session in memory", e);
            Arc::new(InMemoryStore::new())
        }
    }
}
