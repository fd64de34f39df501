//! # Host Bridge Traits
//!
//! Contracts between the sync core and the build host that embeds it.
//!
//! ## Traits
//!
//! - [`HttpClient`](http::HttpClient) - Raw async HTTP transport, one attempt per call
//! - [`KeyValueCache`](host::KeyValueCache) - Durable cache surviving incremental rebuilds
//! - [`NodeStore`](host::NodeStore) - Node creation, touch and lookup in the host data graph
//! - [`AssetStore`](host::AssetStore) - Registers downloaded binary assets as nodes
//!
//! Desktop implementations live in `bridge-desktop`; build hosts embedding
//! the core inject their own.
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should report failures to obtain a response as
//! [`BridgeError::Transport`](error::BridgeError::Transport) so the core can
//! tell retryable failures from the rest.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds so they can be shared
//! across the concurrent downloads of one batch.

pub mod error;
pub mod host;
pub mod http;

pub use error::BridgeError;

pub use host::{AssetHandle, AssetStore, KeyValueCache, Node, NodeStore, RemoteAsset};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
