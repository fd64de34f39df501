//! # Asset Sync Cache
//!
//! Mirrors remote file assets into the host's storage, skipping files that
//! an earlier run already materialized.
//!
//! The durable cache maps each remote file id to the id of the node that
//! backs its local copy. On a hit the node is touched so the host keeps it;
//! on a miss the bytes are downloaded, registered with the host's asset
//! store, and the mapping is recorded. Entries are never deleted here.
//!
//! Records of one batch are processed concurrently; batches run one after
//! another. The first failure in a batch aborts the batch and the run.

use crate::error::{Result, SyncError};
use crate::fetch::RetryingFetch;
use crate::pager::{FilePager, FileRecord};
use bridge_traits::host::{AssetHandle, AssetStore, KeyValueCache, NodeStore, RemoteAsset};
use bridge_traits::http::HttpRequest;
use core_auth::AuthSession;
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Counts of one sync run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    pub batches: usize,
    pub downloaded: usize,
    /// Cache hits whose node was marked live
    pub touched: usize,
}

impl SyncReport {
    fn absorb(&mut self, other: SyncReport) {
        self.batches += other.batches;
        self.downloaded += other.downloaded;
        self.touched += other.touched;
    }
}

enum Outcome {
    Downloaded,
    Touched,
}

/// Split a download filename into base name and extension.
///
/// The extension is the final dot-segment including the dot, or empty when
/// the name has no dot.
pub fn split_filename(filename: &str) -> (String, String) {
    match filename.rfind('.') {
        Some(index) => (filename[..index].to_string(), filename[index..].to_string()),
        None => (filename.to_string(), String::new()),
    }
}

pub struct AssetSyncCache {
    session: Arc<AuthSession>,
    fetch: Arc<RetryingFetch>,
    cache: Arc<dyn KeyValueCache>,
    nodes: Arc<dyn NodeStore>,
    assets: Arc<dyn AssetStore>,
}

impl AssetSyncCache {
    pub fn new(
        session: Arc<AuthSession>,
        fetch: Arc<RetryingFetch>,
        cache: Arc<dyn KeyValueCache>,
        nodes: Arc<dyn NodeStore>,
        assets: Arc<dyn AssetStore>,
    ) -> Self {
        Self {
            session,
            fetch,
            cache,
            nodes,
            assets,
        }
    }

    /// Drain `pager` through the cache, one batch at a time.
    #[instrument(skip_all, fields(page_size = pager.page_size()))]
    pub async fn sync_all(&self, pager: &mut FilePager) -> Result<SyncReport> {
        let mut report = SyncReport::default();

        while let Some(batch) = pager.next_batch().await? {
            report.absorb(self.sync_batch(&batch).await?);
        }

        info!(
            batches = report.batches,
            downloaded = report.downloaded,
            touched = report.touched,
            "File sync complete"
        );
        Ok(report)
    }

    /// Process one batch concurrently. Fails fast on the first error.
    pub async fn sync_batch(&self, batch: &[FileRecord]) -> Result<SyncReport> {
        let outcomes = try_join_all(batch.iter().map(|record| self.sync_record(record))).await?;

        let mut report = SyncReport {
            batches: 1,
            ..SyncReport::default()
        };
        for outcome in outcomes {
            match outcome {
                Outcome::Downloaded => report.downloaded += 1,
                Outcome::Touched => report.touched += 1,
            }
        }

        debug!(
            records = batch.len(),
            downloaded = report.downloaded,
            touched = report.touched,
            "Batch synced"
        );
        Ok(report)
    }

    #[instrument(skip_all, fields(file_id = %record.id))]
    async fn sync_record(&self, record: &FileRecord) -> Result<Outcome> {
        if let Some(node_id) = self.cache.get(&record.id).await? {
            debug!(node_id = %node_id, "Cache hit");
            self.nodes.touch_node(&node_id).await?;
            return Ok(Outcome::Touched);
        }

        let handle = self.download(record).await?;
        self.cache.set(&record.id, &handle.id).await?;
        debug!(node_id = %handle.id, "Asset cached");

        Ok(Outcome::Downloaded)
    }

    async fn download(&self, record: &FileRecord) -> Result<AssetHandle> {
        let url = self.session.endpoints().asset(&record.id);
        let request = HttpRequest::get(url.clone()).headers(self.session.headers().await?);
        let response = self.fetch.fetch_success(request).await?;

        let filename = record.filename_download.as_deref().unwrap_or(&record.id);
        let (name, extension) = split_filename(filename);

        debug!(bytes = response.body.len(), "Downloaded asset");

        let handle = self
            .assets
            .create_file_node(RemoteAsset {
                file_id: record.id.clone(),
                url,
                name,
                extension,
                mime_type: record.mime_type.clone(),
                bytes: response.body,
            })
            .await
            .map_err(SyncError::Host)?;

        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_filename() {
        assert_eq!(
            split_filename("photo.jpg"),
            ("photo".to_string(), ".jpg".to_string())
        );
        assert_eq!(
            split_filename("README"),
            ("README".to_string(), String::new())
        );
        assert_eq!(
            split_filename("archive.tar.gz"),
            ("archive.tar".to_string(), ".gz".to_string())
        );
    }

    #[test]
    fn test_split_filename_edge_dots() {
        assert_eq!(
            split_filename(".env"),
            (String::new(), ".env".to_string())
        );
        assert_eq!(
            split_filename("trailing."),
            ("trailing".to_string(), ".".to_string())
        );
    }

    #[test]
    fn test_report_absorb() {
        let mut total = SyncReport::default();
        total.absorb(SyncReport {
            batches: 1,
            downloaded: 2,
            touched: 0,
        });
        total.absorb(SyncReport {
            batches: 1,
            downloaded: 0,
            touched: 3,
        });

        assert_eq!(
            total,
            SyncReport {
                batches: 2,
                downloaded: 2,
                touched: 3,
            }
        );
    }
}
