//! # Dataset Option Bundles
//!
//! The remote instance exposes two GraphQL datasets: regular content and
//! system content. Each gets a [`DatasetOptions`] bundle that an external
//! [`SchemaDelegator`] consumes to merge the remote schema into the build.
//! The bundles differ only in endpoint and naming; both share the session's
//! headers and the retrying fetch.

use crate::error::{Result, SyncError};
use crate::fetch::RetryingFetch;
use async_trait::async_trait;
use bridge_traits::http::{HttpMethod, HttpRequest, HttpResponse};
use core_auth::AuthSession;
use core_runtime::SyncConfig;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetKind {
    Primary,
    System,
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetKind::Primary => f.write_str("primary"),
            DatasetKind::System => f.write_str("system"),
        }
    }
}

/// Read-only options handed to the schema delegator for one dataset.
#[derive(Clone)]
pub struct DatasetOptions {
    pub kind: DatasetKind,
    /// GraphQL endpoint of the dataset
    pub url: String,
    pub type_name: String,
    pub field_name: String,
    /// Development refetch interval in seconds
    pub refetch_interval: Option<u64>,
    /// Options forwarded untouched from the configuration
    pub passthrough: serde_json::Value,
    session: Arc<AuthSession>,
    fetch: Arc<RetryingFetch>,
}

impl DatasetOptions {
    pub fn new(
        kind: DatasetKind,
        config: &SyncConfig,
        session: Arc<AuthSession>,
        fetch: Arc<RetryingFetch>,
    ) -> Self {
        let endpoints = session.endpoints();
        let (url, type_name, field_name) = match kind {
            DatasetKind::Primary => (
                endpoints.graphql.clone(),
                config.names.type_name.clone(),
                config.names.field_name.clone(),
            ),
            DatasetKind::System => (
                endpoints.system.clone(),
                config.names.system_type_name.clone(),
                config.names.system_field_name.clone(),
            ),
        };

        Self {
            kind,
            url,
            type_name,
            field_name,
            refetch_interval: config.refresh_interval,
            passthrough: config.passthrough.clone(),
            session,
            fetch,
        }
    }

    /// Current request headers, re-resolved on every call
    pub async fn headers(&self) -> Result<HashMap<String, String>> {
        Ok(self.session.headers().await?)
    }

    /// Execute a request through the retrying fetch
    pub async fn fetch(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.fetch.fetch(request).await
    }

    /// Run a GraphQL query against this dataset's endpoint.
    ///
    /// Returns the `data` member; a non-empty `errors` member fails the call.
    pub async fn query(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<serde_json::Value> {
        let request = HttpRequest::new(HttpMethod::Post, self.url.clone())
            .headers(self.headers().await?)
            .json(&serde_json::json!({ "query": query, "variables": variables }))?;

        let mut body: serde_json::Value = self.fetch.fetch_json(request).await?;

        if let Some(errors) = body.get("errors").and_then(|e| e.as_array()) {
            if !errors.is_empty() {
                return Err(SyncError::InvalidResponse {
                    url: self.url.clone(),
                    reason: serde_json::Value::Array(errors.clone()).to_string(),
                });
            }
        }

        Ok(body
            .get_mut("data")
            .map(serde_json::Value::take)
            .unwrap_or(serde_json::Value::Null))
    }
}

impl fmt::Debug for DatasetOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatasetOptions")
            .field("kind", &self.kind)
            .field("url", &self.url)
            .field("type_name", &self.type_name)
            .field("field_name", &self.field_name)
            .field("refetch_interval", &self.refetch_interval)
            .finish_non_exhaustive()
    }
}

/// External service that merges a remote GraphQL schema into the build.
#[async_trait]
pub trait SchemaDelegator: Send + Sync {
    async fn delegate(&self, options: &DatasetOptions) -> Result<()>;
}
