//! Connection pool for the SQLite-backed session store.
//!
//! The store lives in a single SQLite file. When the file cannot be created or opened
//! the pool falls back to an in-memory database, so the client keeps working for the
//! current run and only loses persistence.

use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::OpenFlags;
use tracing::{error, info, warn};

use super::migrations::run_migrations;
use super::DatabaseError;

/// Shared SQLite pool
pub type SqlitePool = Arc<r2d2::Pool<SqliteConnectionManager>>;

/// Default location of the session file
pub const DEFAULT_STORE_PATH: &str = "./data/session.db";

/// Process-wide pool used by the binary
static STORE_POOL: OnceCell<SqlitePool> = OnceCell::new();

/// Session store configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Path to the SQLite file; `None` selects an in-memory store
    pub path: Option<PathBuf>,
    /// Maximum number of pooled connections
    pub max_connections: u32,
    /// Connection timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: Some(PathBuf::from(DEFAULT_STORE_PATH)),
            max_connections: 4,
            timeout_seconds: 5,
        }
    }
}

impl StoreConfig {
    /// In-memory store, used by tests and as a fallback
    pub fn in_memory() -> Self {
        Self {
            path: None,
            ..Self::default()
        }
    }

    /// Read the configuration from the environment.
    ///
    /// `SESSION_STORE_PATH` selects the file (`:memory:` for no persistence);
    /// `SESSION_STORE_MAX_CONNECTIONS` and `SESSION_STORE_TIMEOUT_SECONDS` tune the pool.
    pub fn from_env() -> Result<Self, DatabaseError> {
        let defaults = Self::default();

        let path = match env::var("SESSION_STORE_PATH") {
            Ok(value) if value.trim().is_empty() => {
                return Err(DatabaseError::ConfigError(
                    "SESSION_STORE_PATH is set but empty".to_string(),
                ))
            }
            Ok(value) if value.trim() == ":memory:" => None,
            Ok(value) => Some(PathBuf::from(value.trim())),
            Err(_) => defaults.path.clone(),
        };

        let max_connections = env::var("SESSION_STORE_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(defaults.max_connections);

        let timeout_seconds = env::var("SESSION_STORE_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(defaults.timeout_seconds);

        match &path {
            Some(p) => info!("Using session store at: {}", p.display()),
            None => info!("Using in-memory session store"),
        }

        Ok(Self {
            path,
            max_connections,
            timeout_seconds,
        })
    }
}

/// Open a pool for `config`, falling back to memory if the file is unusable, and make
/// sure the schema exists
pub fn open_pool(config: &StoreConfig) -> Result<SqlitePool, DatabaseError> {
    if let Some(path) = &config.path {
        match open_file_pool(path, config) {
            Ok(pool) => return Ok(pool),
            Err(e) => {
                error!("Failed to open session store at {}: {}", path.display(), e);
                warn!("Falling back to in-memory session store");
            }
        }
    }

    open_in_memory_pool(config)
}

fn open_file_pool(path: &Path, config: &StoreConfig) -> Result<SqlitePool, DatabaseError> {
    info!("Opening session store at: {}", path.display());

    // Create parent directory if it doesn't exist
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::ConfigError(format!("Failed to create directory {:?}: {}", parent, e))
            })?;
        }
    }

    let manager = SqliteConnectionManager::file(path)
        .with_flags(OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE);

    let pool = r2d2::Pool::builder()
        .max_size(config.max_connections)
        .connection_timeout(Duration::from_secs(config.timeout_seconds))
        .build(manager)?;

    // SQLite opens lazily, so only a real statement proves the file is usable
    let conn = pool.get()?;
    run_migrations(&conn)?;
    drop(conn);

    Ok(Arc::new(pool))
}

fn open_in_memory_pool(config: &StoreConfig) -> Result<SqlitePool, DatabaseError> {
    info!("Initializing in-memory session store");

    // Each in-memory connection is its own database, so the pool holds exactly one and
    // never reaps it
    let pool = r2d2::Pool::builder()
        .max_size(1)
        .min_idle(Some(1))
        .idle_timeout(None)
        .max_lifetime(None)
        .connection_timeout(Duration::from_secs(config.timeout_seconds))
        .build(SqliteConnectionManager::memory())?;

    let conn = pool.get()?;
    run_migrations(&conn)?;
    drop(conn);

    Ok(Arc::new(pool))
}

/// Initialize the process-wide pool from the environment
pub fn initialize_store_pool() -> Result<SqlitePool, DatabaseError> {
    let config = StoreConfig::from_env()?;
    initialize_store_pool_with(&config)
}

/// Initialize the process-wide pool with an explicit configuration
pub fn initialize_store_pool_with(config: &StoreConfig) -> Result<SqlitePool, DatabaseError> {
    if STORE_POOL.get().is_some() {
        return Err(DatabaseError::PoolAlreadyInitialized);
    }

    let pool = open_pool(config)?;
    STORE_POOL
        .set(pool.clone())
        .map_err(|_| DatabaseError::PoolAlreadyInitialized)?;
    Ok(pool)
}

/// The process-wide pool
pub fn get_store_pool() -> Result<SqlitePool, DatabaseError> {
    STORE_POOL.get().cloned().ok_or(DatabaseError::PoolNotInitialized)
}

/// Human-readable description of where a pool stores its data
pub fn describe_pool(pool: &SqlitePool) -> String {
    let location = pool
        .get()
        .ok()
        .and_then(|conn| {
            conn.query_row("PRAGMA database_list", [], |row| row.get::<_, String>(2))
                .ok()
        })
        .map(|path| {
            if path.is_empty() || path == ":memory:" {
                "in-memory session store".to_string()
            } else {
                format!("session store at {}", path)
            }
        })
        .unwrap_or_else(|| "session store (location unknown)".to_string());

    let state = pool.state();
    format!(
        "{} (connections: active={}, idle={})",
        location, state.connections, state.idle_connections
    )
}
