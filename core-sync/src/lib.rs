//! # Sync Module
//!
//! Mirrors a remote Directus instance into a static-site build.
//!
//! ## Overview
//!
//! - Exposes the primary and system GraphQL datasets as option bundles for an
//!   external schema delegator
//! - Enumerates remote files page by page
//! - Downloads each file at most once across incremental rebuilds, keyed by
//!   file id in the host's durable cache
//!
//! ## Components
//!
//! - **Retrying Fetch** (`fetch`): Exponential backoff over the host transport
//! - **File Pager** (`pager`): Pull-based cursor over the file listing
//! - **Asset Sync Cache** (`asset_cache`): Download-or-touch per file, batch by batch
//! - **Datasets** (`datasets`): Option bundles and the `SchemaDelegator` seam
//! - **Image Resolver** (`resolver`): Maps file ids to cached nodes at query time
//! - **Sync Coordinator** (`coordinator`): Write-once configuration and orchestration

pub mod asset_cache;
pub mod coordinator;
pub mod datasets;
pub mod error;
pub mod fetch;
pub mod pager;
pub mod resolver;

pub use asset_cache::{split_filename, AssetSyncCache, SyncReport};
pub use coordinator::{HostBridges, SyncCoordinator};
pub use datasets::{DatasetKind, DatasetOptions, SchemaDelegator};
pub use error::{Result, SyncError};
pub use fetch::RetryingFetch;
pub use pager::{FilePager, FileRecord};
pub use resolver::{image_resolver_targets, ImageFieldResolver, ResolverTarget, IMAGE_FIELD};
