//! Build-Host Abstractions
//!
//! Services the static-site build host provides to the core: a durable
//! key/value cache that survives incremental rebuilds, the node graph, and
//! the storage layer that materializes downloaded assets.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A node in the host's data graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    /// Host type name (e.g. `File`)
    pub node_type: String,
    /// Digest of the node's content, used by the host for change detection
    pub content_digest: String,
    /// Arbitrary node fields
    #[serde(default)]
    pub fields: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Handle returned by the storage layer after an asset has been registered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetHandle {
    /// Identifier of the node backing the asset
    pub id: String,
}

/// A downloaded binary asset waiting to be registered with the host.
#[derive(Debug, Clone)]
pub struct RemoteAsset {
    /// Remote file identifier
    pub file_id: String,
    /// URL the bytes were downloaded from
    pub url: String,
    /// Base name without extension
    pub name: String,
    /// Extension including the leading dot, or empty
    pub extension: String,
    pub mime_type: Option<String>,
    pub bytes: Bytes,
}

/// Durable key/value cache provided by the build host.
///
/// Entries persist across incremental rebuilds. The core never deletes
/// entries; garbage collection is left to the host.
#[async_trait]
pub trait KeyValueCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Node graph operations exposed by the build host.
#[async_trait]
pub trait NodeStore: Send + Sync {
    async fn create_node(&self, node: Node) -> Result<()>;

    /// Mark a node as still live so the host does not garbage-collect it.
    async fn touch_node(&self, node_id: &str) -> Result<()>;

    async fn get_node(&self, node_id: &str) -> Result<Option<Node>>;
}

/// Storage layer that materializes a downloaded asset as a node.
#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn create_file_node(&self, asset: RemoteAsset) -> Result<AssetHandle>;
}
