//! Node store using SQLite

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    host::{Node, NodeStore},
};
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqlitePool, Row};
use tracing::{debug, warn};

/// SQLite-backed node graph.
///
/// Shares a database with [`SqliteKeyValueCache`](crate::SqliteKeyValueCache)
/// so cache entries and the nodes they point at persist together. Touches
/// are recorded as timestamps for the host's garbage collection.
pub struct SqliteNodeStore {
    pool: SqlitePool,
}

impl SqliteNodeStore {
    pub async fn in_memory() -> Result<Self> {
        Self::from_pool(crate::db::connect_in_memory().await?).await
    }

    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS nodes (
                id TEXT PRIMARY KEY,
                node_type TEXT NOT NULL,
                content_digest TEXT NOT NULL,
                fields TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                touched_at INTEGER
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| BridgeError::OperationFailed(format!("Failed to create table: {}", e)))?;

        Ok(Self { pool })
    }

    /// When the node was last marked live, if ever
    pub async fn last_touched(&self, node_id: &str) -> Result<Option<DateTime<Utc>>> {
        let row = sqlx::query("SELECT touched_at FROM nodes WHERE id = ?")
            .bind(node_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| BridgeError::OperationFailed(format!("Failed to read node: {}", e)))?;

        Ok(row
            .and_then(|row| row.get::<Option<i64>, _>(0))
            .and_then(DateTime::from_timestamp_millis))
    }

    pub async fn count(&self) -> Result<usize> {
        let row = sqlx::query("SELECT COUNT(*) FROM nodes")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| BridgeError::OperationFailed(format!("Failed to count nodes: {}", e)))?;

        let count: i64 = row.get(0);
        Ok(count as usize)
    }
}

#[async_trait]
impl NodeStore for SqliteNodeStore {
    async fn create_node(&self, node: Node) -> Result<()> {
        let fields = serde_json::to_string(&node.fields).map_err(|e| {
            BridgeError::OperationFailed(format!("Failed to encode node fields: {}", e))
        })?;

        sqlx::query(
            r#"
            INSERT INTO nodes (id, node_type, content_digest, fields, created_at, touched_at)
            VALUES (?, ?, ?, ?, ?, NULL)
            ON CONFLICT(id) DO UPDATE SET
                node_type = excluded.node_type,
                content_digest = excluded.content_digest,
                fields = excluded.fields
            "#,
        )
        .bind(&node.id)
        .bind(&node.node_type)
        .bind(&node.content_digest)
        .bind(fields)
        .bind(node.created_at.timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(|e| BridgeError::OperationFailed(format!("Failed to store node: {}", e)))?;

        debug!(node_id = %node.id, node_type = %node.node_type, "Created node");
        Ok(())
    }

    async fn touch_node(&self, node_id: &str) -> Result<()> {
        let result = sqlx::query("UPDATE nodes SET touched_at = ? WHERE id = ?")
            .bind(Utc::now().timestamp_millis())
            .bind(node_id)
            .execute(&self.pool)
            .await
            .map_err(|e| BridgeError::OperationFailed(format!("Failed to touch node: {}", e)))?;

        if result.rows_affected() == 0 {
            warn!(node_id, "Touched unknown node");
        }
        Ok(())
    }

    async fn get_node(&self, node_id: &str) -> Result<Option<Node>> {
        let row = sqlx::query(
            "SELECT id, node_type, content_digest, fields, created_at FROM nodes WHERE id = ?",
        )
        .bind(node_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| BridgeError::OperationFailed(format!("Failed to read node: {}", e)))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let fields: String = row.get(3);
        let created_at: i64 = row.get(4);

        Ok(Some(Node {
            id: row.get(0),
            node_type: row.get(1),
            content_digest: row.get(2),
            fields: serde_json::from_str(&fields).map_err(|e| {
                BridgeError::OperationFailed(format!("Corrupt node fields: {}", e))
            })?,
            created_at: DateTime::from_timestamp_millis(created_at).unwrap_or_default(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str) -> Node {
        Node {
            id: id.to_string(),
            node_type: "File".to_string(),
            content_digest: "abc".to_string(),
            fields: serde_json::json!({ "name": "photo" }),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get_node() {
        let store = SqliteNodeStore::in_memory().await.unwrap();
        store.create_node(node("n1")).await.unwrap();

        let loaded = store.get_node("n1").await.unwrap().unwrap();
        assert_eq!(loaded.node_type, "File");
        assert_eq!(loaded.fields["name"], "photo");
        assert!(store.get_node("missing").await.unwrap().is_none());
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_touch_records_timestamp() {
        let store = SqliteNodeStore::in_memory().await.unwrap();
        store.create_node(node("n1")).await.unwrap();

        assert_eq!(store.last_touched("n1").await.unwrap(), None);
        store.touch_node("n1").await.unwrap();
        assert!(store.last_touched("n1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_touching_unknown_node_is_not_an_error() {
        let store = SqliteNodeStore::in_memory().await.unwrap();
        assert!(store.touch_node("ghost").await.is_ok());
    }
}
