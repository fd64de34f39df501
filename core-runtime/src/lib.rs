//! # Core Runtime Module
//!
//! Foundational pieces every other crate depends on:
//! - Validated sync configuration and the JSON plugin-option schema
//! - Endpoint derivation from the configured root URL
//! - Logging and tracing bootstrap
//!
//! Configuration is validated once, before any component is constructed or
//! any request is sent.

pub mod config;
pub mod endpoints;
pub mod error;
pub mod logging;

pub use config::{
    Credentials, DatasetNames, HeaderSource, RefreshSetting, SyncConfig, SyncConfigBuilder,
};
pub use endpoints::Endpoints;
pub use error::{Error, Result};
