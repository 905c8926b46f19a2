use tracing::debug;

use super::DatabaseError;

/// Create the key-value table backing the session store
pub fn run_migrations(conn: &rusqlite::Connection) -> Result<(), DatabaseError> {
    debug!("Running session store migrations");

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS local_storage (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );",
    )
    .map_err(|e| DatabaseError::MigrationError(e.to_string()))?;

    Ok(())
}
