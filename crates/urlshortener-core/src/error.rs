use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors related to the core types of the URL shortener.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("expiration offset must be a positive number of seconds, got {0}")]
    InvalidExpirationOffset(i64),
}

#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("{0} is not initialized")]
    Uninitialized(&'static str),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
    #[error("storage operation failed: {0}")]
    Operation(String),
}

#[derive(Debug, Clone, Error)]
pub enum ShortenerError {
    #[error("no algorithm specified")]
    NoAlgorithm,
    #[error("no URL specified")]
    NoUrl,
    #[error("invalid url format: {0}")]
    InvalidUrl(String),
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<CoreError> for ShortenerError {
    fn from(value: CoreError) -> Self {
        match value {
            CoreError::UnsupportedAlgorithm(name) => Self::UnsupportedAlgorithm(name),
            other => Self::InvalidConfiguration(other.to_string()),
        }
    }
}
