use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("[directus-sync] Bridge operation failed: {0}")]
    OperationFailed(String),

    /// The request never produced a response (connect, DNS, reset, timeout).
    #[error("[directus-sync] Transport error: {0}")]
    Transport(String),

    #[error("[directus-sync] IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
