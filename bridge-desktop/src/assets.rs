//! Filesystem asset store

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    host::{AssetHandle, AssetStore, Node, NodeStore, RemoteAsset},
};
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Writes downloaded assets to a directory and registers one node per file.
///
/// Files are content-addressed: `<sha256 of bytes><extension>`. Node ids are
/// derived from the remote file id, so re-registering a file replaces its
/// node instead of adding a second one.
pub struct FsAssetStore {
    dir: PathBuf,
    nodes: Arc<dyn NodeStore>,
}

impl FsAssetStore {
    pub fn new(dir: impl Into<PathBuf>, nodes: Arc<dyn NodeStore>) -> Self {
        Self {
            dir: dir.into(),
            nodes,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Node id for a remote file
    pub fn node_id(file_id: &str) -> String {
        format!("{:x}", Sha256::digest(format!("directus-file:{}", file_id)))
    }

    /// Whether `path` exists and its contents hash to `digest`
    async fn holds_digest(path: &Path, digest: &str) -> Result<bool> {
        match tokio::fs::read(path).await {
            Ok(existing) => Ok(format!("{:x}", Sha256::digest(&existing)) == digest),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(BridgeError::Io(e)),
        }
    }
}

#[async_trait]
impl AssetStore for FsAssetStore {
    async fn create_file_node(&self, asset: RemoteAsset) -> Result<AssetHandle> {
        let digest = format!("{:x}", Sha256::digest(&asset.bytes));
        let path = self.dir.join(format!("{}{}", digest, asset.extension));

        let id = Self::node_id(&asset.file_id);

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(BridgeError::Io)?;
        if !Self::holds_digest(&path, &digest).await? {
            // Staged per node so identical bodies in one batch never share a
            // partial file; rename replaces any truncated leftover
            let staging = self.dir.join(format!(".{}.{}.part", digest, id));
            tokio::fs::write(&staging, &asset.bytes)
                .await
                .map_err(BridgeError::Io)?;
            tokio::fs::rename(&staging, &path)
                .await
                .map_err(BridgeError::Io)?;
        }

        self.nodes
            .create_node(Node {
                id: id.clone(),
                node_type: "File".to_string(),
                content_digest: digest,
                fields: serde_json::json!({
                    "file_id": asset.file_id,
                    "url": asset.url,
                    "name": asset.name,
                    "extension": asset.extension,
                    "mime_type": asset.mime_type,
                    "size": asset.bytes.len(),
                    "path": path.to_string_lossy(),
                }),
                created_at: Utc::now(),
            })
            .await?;

        debug!(file_id = %asset.file_id, node_id = %id, "Registered asset");
        Ok(AssetHandle { id })
    }
}
