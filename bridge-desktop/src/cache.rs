//! Durable key/value cache using SQLite

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    host::KeyValueCache,
};
use chrono::Utc;
use sqlx::{sqlite::SqlitePool, Row};
use std::path::Path;
use tracing::debug;

/// SQLite-backed cache that survives across build processes.
pub struct SqliteKeyValueCache {
    pool: SqlitePool,
}

impl SqliteKeyValueCache {
    /// Open the cache stored at `db_path`
    pub async fn new(db_path: &Path) -> Result<Self> {
        Self::from_pool(crate::db::connect(db_path).await?).await
    }

    /// Create an in-memory cache (for testing)
    pub async fn in_memory() -> Result<Self> {
        Self::from_pool(crate::db::connect_in_memory().await?).await
    }

    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv_cache (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| BridgeError::OperationFailed(format!("Failed to create table: {}", e)))?;

        Ok(Self { pool })
    }

    pub async fn len(&self) -> Result<usize> {
        let row = sqlx::query("SELECT COUNT(*) FROM kv_cache")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| BridgeError::OperationFailed(format!("Failed to count entries: {}", e)))?;

        let count: i64 = row.get(0);
        Ok(count as usize)
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }
}

#[async_trait]
impl KeyValueCache for SqliteKeyValueCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM kv_cache WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| BridgeError::OperationFailed(format!("Failed to read cache: {}", e)))?;

        Ok(row.map(|row| row.get(0)))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO kv_cache (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().timestamp())
        .execute(&self.pool)
        .await
        .map_err(|e| BridgeError::OperationFailed(format!("Failed to write cache: {}", e)))?;

        debug!(key = key, "Stored cache entry");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = SqliteKeyValueCache::in_memory().await.unwrap();

        assert_eq!(cache.get("file-1").await.unwrap(), None);
        cache.set("file-1", "node-1").await.unwrap();
        assert_eq!(cache.get("file-1").await.unwrap(), Some("node-1".to_string()));
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let cache = SqliteKeyValueCache::in_memory().await.unwrap();

        cache.set("file-1", "node-1").await.unwrap();
        cache.set("file-1", "node-2").await.unwrap();

        assert_eq!(cache.get("file-1").await.unwrap(), Some("node-2".to_string()));
        assert_eq!(cache.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_entries_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cache.db");

        {
            let cache = SqliteKeyValueCache::new(&path).await.unwrap();
            cache.set("file-1", "node-1").await.unwrap();
        }

        let reopened = SqliteKeyValueCache::new(&path).await.unwrap();
        assert_eq!(reopened.get("file-1").await.unwrap(), Some("node-1".to_string()));
    }
}
