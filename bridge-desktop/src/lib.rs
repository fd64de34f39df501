//! # Desktop Bridge Implementations
//!
//! Default host services for running the sync outside a build host that
//! provides its own:
//!
//! - `ReqwestHttpClient`: single-attempt HTTP transport
//! - `SqliteKeyValueCache`: durable key/value cache
//! - `SqliteNodeStore`: node graph sharing the cache database
//! - `FsAssetStore`: content-addressed asset files on disk

pub mod assets;
pub mod cache;
pub mod db;
pub mod http;
pub mod nodes;

pub use assets::FsAssetStore;
pub use cache::SqliteKeyValueCache;
pub use http::ReqwestHttpClient;
pub use nodes::SqliteNodeStore;
