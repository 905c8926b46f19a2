use std::sync::PoisonError;
use thiserror::Error;

use crate::database::DatabaseError;

/// Error type for session storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// Store setup error
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLite error
    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection pool error
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// Stored value could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Mutex lock error
    #[error("Lock error: {0}")]
    Lock(String),
}

impl<T> From<PoisonError<T>> for StorageError {
    fn from(error: PoisonError<T>) -> Self {
        StorageError::Lock(error.to_string())
    }
}
