//! SQLite pool shared by the cache and node store

use bridge_traits::error::{BridgeError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use tracing::debug;

/// Open (creating if needed) the database at `db_path`.
pub async fn connect(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(BridgeError::Io)?;
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(options)
        .await
        .map_err(|e| BridgeError::OperationFailed(format!("Failed to connect to DB: {}", e)))?;

    debug!(path = ?db_path, "Opened cache database");
    Ok(pool)
}

/// Private in-memory database (for testing)
///
/// Limited to one connection; every connection to `sqlite::memory:` would
/// otherwise see its own empty database.
pub async fn connect_in_memory() -> Result<SqlitePool> {
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .map_err(|e| BridgeError::OperationFailed(format!("Failed to connect to DB: {}", e)))
}
