use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("[directus-sync] Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
