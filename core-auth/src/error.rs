use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("[directus-sync] Login failed: {reason}. Check the configured email and password.")]
    LoginFailed { reason: String },

    #[error("[directus-sync] Token refresh failed: {0}")]
    TokenRefreshFailed(String),

    #[error("[directus-sync] Invalid auth response: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    Config(#[from] core_runtime::Error),
}

pub type Result<T> = std::result::Result<T, AuthError>;
