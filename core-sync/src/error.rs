use bridge_traits::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Config(#[from] core_runtime::Error),

    #[error(transparent)]
    Auth(#[from] core_auth::AuthError),

    /// Retry budget exhausted without obtaining a response
    #[error("[directus-sync] Request to {url} failed after {attempts} attempt(s): {source}")]
    Transport {
        url: String,
        attempts: u32,
        #[source]
        source: BridgeError,
    },

    #[error("[directus-sync] {url} returned HTTP {status}: {body}")]
    Api {
        url: String,
        status: u16,
        body: String,
    },

    #[error("[directus-sync] Invalid response from {url}: {reason}")]
    InvalidResponse { url: String, reason: String },

    /// The host handed a resolver a parent object it cannot read
    #[error("[directus-sync] Cannot resolve `{field}`: {reason}")]
    InvalidSource { field: String, reason: String },

    #[error("[directus-sync] No cached asset for file {file_id}; it was not synced in this build")]
    CacheMiss { file_id: String },

    #[error("[directus-sync] Cached asset {node_id} for file {file_id} no longer exists in the node store")]
    MissingNode { file_id: String, node_id: String },

    #[error("[directus-sync] Sync session not established; call configure() first")]
    NotReady,

    #[error("[directus-sync] Already configured with different options; configuration is write-once")]
    AlreadyConfigured,

    #[error(transparent)]
    Host(#[from] BridgeError),
}

pub type Result<T> = std::result::Result<T, SyncError>;
