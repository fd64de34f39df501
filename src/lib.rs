//! # Directus Sync
//!
//! Mirrors a Directus instance into a static-site build: authenticates
//! against the remote API, exposes its two GraphQL datasets to the host's
//! schema delegator, and mirrors file assets into the host's cache without
//! downloading the same file twice across incremental rebuilds.
//!
//! Hosts that provide their own services build a [`HostBridges`] and hand it
//! to [`SyncCoordinator::new`]. Standalone tools enable the `desktop-shims`
//! feature (on by default) and call [`bootstrap_desktop`], which wires the
//! reqwest transport and the SQLite/filesystem stores from `bridge-desktop`.
//!
//! ```ignore
//! use directus_sync::{bootstrap_desktop, SyncConfig};
//!
//! let coordinator = bootstrap_desktop(".cache/directus").await?;
//! coordinator.configure(SyncConfig::from_options(options)?).await?;
//! let report = coordinator.run_build(&delegator).await?;
//! ```

pub use bridge_traits::{
    AssetHandle, AssetStore, BridgeError, HttpClient, HttpRequest, HttpResponse, KeyValueCache,
    Node, NodeStore, RemoteAsset, RetryPolicy,
};
pub use core_auth::{AuthError, AuthSession};
pub use core_runtime::logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
pub use core_runtime::{Credentials, DatasetNames, Endpoints, HeaderSource, SyncConfig};
pub use core_sync::{
    split_filename, DatasetKind, DatasetOptions, FilePager, FileRecord, HostBridges,
    ImageFieldResolver, ResolverTarget, SchemaDelegator, SyncCoordinator, SyncError, SyncReport,
};

#[cfg(feature = "desktop-shims")]
pub use desktop::{bootstrap_desktop, desktop_bridges};

#[cfg(feature = "desktop-shims")]
mod desktop {
    use bridge_desktop::{FsAssetStore, ReqwestHttpClient, SqliteKeyValueCache, SqliteNodeStore};
    use core_sync::{HostBridges, Result, SyncCoordinator};
    use std::path::Path;
    use std::sync::Arc;
    use tracing::info;

    /// Desktop host services rooted at `cache_dir`.
    ///
    /// Cache entries and nodes live in `<cache_dir>/directus-sync.db`; asset
    /// files are written to `<cache_dir>/assets`.
    pub async fn desktop_bridges(cache_dir: impl AsRef<Path>) -> Result<HostBridges> {
        let cache_dir = cache_dir.as_ref();
        let pool = bridge_desktop::db::connect(&cache_dir.join("directus-sync.db")).await?;

        let cache = Arc::new(SqliteKeyValueCache::from_pool(pool.clone()).await?);
        let nodes = Arc::new(SqliteNodeStore::from_pool(pool).await?);
        let assets = Arc::new(FsAssetStore::new(cache_dir.join("assets"), nodes.clone()));

        info!(cache_dir = ?cache_dir, "Desktop bridges ready");

        Ok(HostBridges {
            http_client: Arc::new(ReqwestHttpClient::new()?),
            cache,
            nodes,
            assets,
        })
    }

    /// Coordinator wired to the desktop bridges.
    pub async fn bootstrap_desktop(cache_dir: impl AsRef<Path>) -> Result<SyncCoordinator> {
        Ok(SyncCoordinator::new(desktop_bridges(cache_dir).await?))
    }

}
