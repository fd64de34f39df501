//! # Sync Coordinator
//!
//! Composes the sync pipeline for one build process.
//!
//! ## Overview
//!
//! The coordinator owns a single write-once configuration slot:
//!
//! 1. [`configure`](SyncCoordinator::configure) validates the configuration,
//!    derives the endpoints and establishes the auth session. Calling it again
//!    with the same configuration returns the existing session; a different
//!    configuration is rejected.
//! 2. [`dataset_options`](SyncCoordinator::dataset_options) exposes the
//!    primary and system bundles for the schema delegator.
//! 3. [`sync_files`](SyncCoordinator::sync_files) drives the file pager
//!    through the asset cache.
//!
//! [`run_build`](SyncCoordinator::run_build) runs steps 2 and 3 in sequence,
//! once per build.
//!
//! ## Usage
//!
//! ```ignore
//! let coordinator = SyncCoordinator::new(bridges);
//! coordinator.configure(SyncConfig::from_options(options)?).await?;
//! let report = coordinator.run_build(&delegator).await?;
//! ```

use crate::asset_cache::{AssetSyncCache, SyncReport};
use crate::datasets::{DatasetKind, DatasetOptions, SchemaDelegator};
use crate::error::{Result, SyncError};
use crate::fetch::RetryingFetch;
use crate::pager::FilePager;
use crate::resolver::{image_resolver_targets, ImageFieldResolver, ResolverTarget};
use bridge_traits::host::{AssetStore, KeyValueCache, NodeStore};
use bridge_traits::http::HttpClient;
use core_auth::AuthSession;
use core_runtime::{Endpoints, SyncConfig};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

/// Services the build host provides.
#[derive(Clone)]
pub struct HostBridges {
    pub http_client: Arc<dyn HttpClient>,
    pub cache: Arc<dyn KeyValueCache>,
    pub nodes: Arc<dyn NodeStore>,
    pub assets: Arc<dyn AssetStore>,
}

struct Established {
    config: SyncConfig,
    session: Arc<AuthSession>,
    fetch: Arc<RetryingFetch>,
}

pub struct SyncCoordinator {
    bridges: HostBridges,
    state: Mutex<Option<Arc<Established>>>,
}

impl SyncCoordinator {
    pub fn new(bridges: HostBridges) -> Self {
        Self {
            bridges,
            state: Mutex::new(None),
        }
    }

    /// Validate `config` and establish the session, once.
    #[instrument(skip_all, fields(url = %config.url))]
    pub async fn configure(&self, config: SyncConfig) -> Result<Arc<AuthSession>> {
        let mut slot = self.state.lock().await;

        if let Some(existing) = slot.as_ref() {
            if existing.config == config {
                debug!("Already configured, reusing session");
                return Ok(existing.session.clone());
            }
            return Err(SyncError::AlreadyConfigured);
        }

        config.validate()?;
        let endpoints = Endpoints::resolve(&config.url)?;
        let session = Arc::new(
            AuthSession::establish(&config, endpoints, self.bridges.http_client.clone()).await?,
        );
        let fetch = Arc::new(RetryingFetch::new(
            self.bridges.http_client.clone(),
            config.retry_policy(),
        ));

        info!(
            concurrency = config.concurrency,
            retries = config.retries,
            authenticated = session.is_authenticated().await,
            "Sync session established"
        );

        *slot = Some(Arc::new(Established {
            config,
            session: session.clone(),
            fetch,
        }));

        Ok(session)
    }

    async fn established(&self) -> Result<Arc<Established>> {
        self.state.lock().await.clone().ok_or(SyncError::NotReady)
    }

    pub async fn is_configured(&self) -> bool {
        self.state.lock().await.is_some()
    }

    pub async fn session(&self) -> Result<Arc<AuthSession>> {
        Ok(self.established().await?.session.clone())
    }

    /// Primary and system bundles, in that order.
    pub async fn dataset_options(&self) -> Result<[DatasetOptions; 2]> {
        let state = self.established().await?;

        Ok([DatasetKind::Primary, DatasetKind::System].map(|kind| {
            DatasetOptions::new(kind, &state.config, state.session.clone(), state.fetch.clone())
        }))
    }

    /// Hand both bundles to the delegator, primary first.
    #[instrument(skip_all)]
    pub async fn source_datasets(&self, delegator: &dyn SchemaDelegator) -> Result<()> {
        for options in self.dataset_options().await? {
            info!(dataset = %options.kind, url = %options.url, "Sourcing dataset");
            delegator.delegate(&options).await?;
        }
        Ok(())
    }

    pub async fn file_pager(&self) -> Result<FilePager> {
        let state = self.established().await?;
        Ok(FilePager::new(
            state.session.clone(),
            state.fetch.clone(),
            state.config.concurrency,
        ))
    }

    pub async fn asset_cache(&self) -> Result<AssetSyncCache> {
        let state = self.established().await?;
        Ok(AssetSyncCache::new(
            state.session.clone(),
            state.fetch.clone(),
            self.bridges.cache.clone(),
            self.bridges.nodes.clone(),
            self.bridges.assets.clone(),
        ))
    }

    /// Mirror every remote file into the host cache.
    #[instrument(skip_all)]
    pub async fn sync_files(&self) -> Result<SyncReport> {
        let mut pager = self.file_pager().await?;
        let cache = self.asset_cache().await?;

        info!("Syncing files");
        cache.sync_all(&mut pager).await
    }

    /// Source both datasets, then sync files.
    #[instrument(skip_all)]
    pub async fn run_build(&self, delegator: &dyn SchemaDelegator) -> Result<SyncReport> {
        self.source_datasets(delegator).await?;
        self.sync_files().await
    }

    /// Resolver for the image field; usable once files have been synced.
    pub fn image_resolver(&self) -> ImageFieldResolver {
        ImageFieldResolver::new(self.bridges.cache.clone(), self.bridges.nodes.clone())
    }

    pub async fn image_resolver_targets(&self) -> Result<Vec<ResolverTarget>> {
        let state = self.established().await?;
        Ok(image_resolver_targets(&state.config.names))
    }
}
