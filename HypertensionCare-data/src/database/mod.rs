use thiserror::Error;

// Storage modules
#[cfg(feature = "sqlite")]
pub mod connection;
#[cfg(feature = "sqlite")]
pub mod migrations;

// Re-export connection functions
#[cfg(feature = "sqlite")]
pub use connection::*;

/// Storage database error
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Configuration error
    #[error("Session store configuration error: {0}")]
    ConfigError(String),

    /// SQLite error
    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),

    /// Connection pool error
    #[error("Connection pool error: {0}")]
    PoolError(#[from] r2d2::Error),

    /// Migration error
    #[error("Session store migration error: {0}")]
    MigrationError(String),

    /// Pool already initialized
    #[error("Session store pool is already initialized")]
    PoolAlreadyInitialized,

    /// Pool not initialized
    #[error("Session store pool is not initialized")]
    PoolNotInitialized,
}

impl From<String> for DatabaseError {
    fn from(error: String) -> Self {
        DatabaseError::ConfigError(error)
    }
}
