//! # Image Field Resolver
//!
//! Resolves the image field of file objects in both datasets to the node
//! that backs the locally cached copy. Resolution fails loudly when the file
//! was not synced, and the failure stays confined to that one field.

use crate::error::{Result, SyncError};
use bridge_traits::host::{KeyValueCache, Node, NodeStore};
use core_runtime::DatasetNames;
use std::sync::Arc;
use tracing::{debug, warn};

/// Field added to file objects of both datasets
pub const IMAGE_FIELD: &str = "imageFile";

/// A type/field pair the host should attach the resolver to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverTarget {
    /// e.g. `DirectusData_directus_files`
    pub type_name: String,
    pub field_name: String,
}

/// Targets for both datasets' file types
pub fn image_resolver_targets(names: &DatasetNames) -> Vec<ResolverTarget> {
    [&names.type_name, &names.system_type_name]
        .into_iter()
        .map(|type_name| ResolverTarget {
            type_name: format!("{}_directus_files", type_name),
            field_name: IMAGE_FIELD.to_string(),
        })
        .collect()
}

#[derive(Clone)]
pub struct ImageFieldResolver {
    cache: Arc<dyn KeyValueCache>,
    nodes: Arc<dyn NodeStore>,
}

impl ImageFieldResolver {
    pub fn new(cache: Arc<dyn KeyValueCache>, nodes: Arc<dyn NodeStore>) -> Self {
        Self { cache, nodes }
    }

    /// Look up the node cached for `file_id`.
    pub async fn resolve(&self, file_id: &str) -> Result<Node> {
        let node_id = self.cache.get(file_id).await?.ok_or_else(|| {
            warn!(file_id, "Image requested for a file that was never synced");
            SyncError::CacheMiss {
                file_id: file_id.to_string(),
            }
        })?;

        let node = self
            .nodes
            .get_node(&node_id)
            .await?
            .ok_or_else(|| SyncError::MissingNode {
                file_id: file_id.to_string(),
                node_id: node_id.clone(),
            })?;

        debug!(file_id, node_id = %node.id, "Resolved image field");
        Ok(node)
    }

    /// Resolve from the parent file object, which carries the file id in `id`.
    pub async fn resolve_source(&self, source: &serde_json::Value) -> Result<Node> {
        let file_id = source
            .get("id")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| SyncError::InvalidSource {
                field: IMAGE_FIELD.to_string(),
                reason: "source object has no string `id`".to_string(),
            })?;

        self.resolve(file_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct MapCache(Mutex<HashMap<String, String>>);

    #[async_trait]
    impl KeyValueCache for MapCache {
        async fn get(&self, key: &str) -> bridge_traits::error::Result<Option<String>> {
            Ok(self.0.lock().await.get(key).cloned())
        }

        async fn set(&self, key: &str, value: &str) -> bridge_traits::error::Result<()> {
            self.0.lock().await.insert(key.to_string(), value.to_string());
            Ok(())
        }
    }

    #[derive(Default)]
    struct MapNodes(Mutex<HashMap<String, Node>>);

    #[async_trait]
    impl NodeStore for MapNodes {
        async fn create_node(&self, node: Node) -> bridge_traits::error::Result<()> {
            self.0.lock().await.insert(node.id.clone(), node);
            Ok(())
        }

        async fn touch_node(&self, _node_id: &str) -> bridge_traits::error::Result<()> {
            Ok(())
        }

        async fn get_node(&self, node_id: &str) -> bridge_traits::error::Result<Option<Node>> {
            Ok(self.0.lock().await.get(node_id).cloned())
        }
    }

    fn node(id: &str) -> Node {
        Node {
            id: id.to_string(),
            node_type: "File".to_string(),
            content_digest: "digest".to_string(),
            fields: serde_json::Value::Null,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_targets_cover_both_datasets() {
        let targets = image_resolver_targets(&DatasetNames::default());

        assert_eq!(
            targets,
            vec![
                ResolverTarget {
                    type_name: "DirectusData_directus_files".to_string(),
                    field_name: "imageFile".to_string(),
                },
                ResolverTarget {
                    type_name: "DirectusSystemData_directus_files".to_string(),
                    field_name: "imageFile".to_string(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_resolves_cached_node() {
        let cache = Arc::new(MapCache::default());
        let nodes = Arc::new(MapNodes::default());
        cache.set("file-1", "node-1").await.unwrap();
        nodes.create_node(node("node-1")).await.unwrap();

        let resolver = ImageFieldResolver::new(cache, nodes);
        let resolved = resolver.resolve("file-1").await.unwrap();
        assert_eq!(resolved.id, "node-1");

        let from_source = resolver
            .resolve_source(&serde_json::json!({ "id": "file-1", "title": "Cover" }))
            .await
            .unwrap();
        assert_eq!(from_source.id, "node-1");
    }

    #[tokio::test]
    async fn test_unsynced_file_is_a_cache_miss() {
        let resolver = ImageFieldResolver::new(
            Arc::new(MapCache::default()),
            Arc::new(MapNodes::default()),
        );

        let err = resolver.resolve("ghost").await.unwrap_err();
        assert!(matches!(err, SyncError::CacheMiss { ref file_id } if file_id == "ghost"));
        assert!(err.to_string().starts_with("[directus-sync]"));
    }

    #[tokio::test]
    async fn test_collected_node_is_reported() {
        let cache = Arc::new(MapCache::default());
        cache.set("file-1", "node-gone").await.unwrap();
        let resolver = ImageFieldResolver::new(cache, Arc::new(MapNodes::default()));

        let err = resolver.resolve("file-1").await.unwrap_err();
        assert!(matches!(err, SyncError::MissingNode { .. }));
    }

    #[tokio::test]
    async fn test_source_without_id_is_rejected() {
        let resolver = ImageFieldResolver::new(
            Arc::new(MapCache::default()),
            Arc::new(MapNodes::default()),
        );

        let err = resolver
            .resolve_source(&serde_json::json!({ "title": "Cover" }))
            .await
            .unwrap_err();
        match &err {
            SyncError::InvalidSource { field, reason } => {
                assert_eq!(field, "imageFile");
                assert!(reason.contains("source object"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!err.to_string().contains("Invalid response from"));
    }
}
