use crate::algorithm::AlgorithmType;
use crate::error::StorageError;
use async_trait::async_trait;
use std::future::Future;

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Persistence contract for URL mappings.
///
/// Data operations fail with [`StorageError::Uninitialized`] unless the
/// repository has been opened with [`UrlRepository::initialize`] and not yet
/// closed with [`UrlRepository::finalize`].
#[async_trait]
pub trait UrlRepository: Send + Sync + 'static {
    /// Opens the underlying storage. Calling it on an open repository is a no-op.
    async fn initialize(&self) -> Result<()>;

    /// Releases the underlying storage. Calling it on a closed repository is a no-op.
    async fn finalize(&self) -> Result<()>;

    /// Creates or overwrites the mapping for (`algorithm`, `original_url`),
    /// stamping it with the current time and a fresh expiration time.
    async fn save_url_mapping(
        &self,
        original_url: &str,
        short_url: &str,
        algorithm: AlgorithmType,
    ) -> Result<()>;

    /// Returns the short URL of the live mapping for (`algorithm`, `original_url`).
    /// Missing or expired mappings yield `None`.
    async fn get_short_url(
        &self,
        original_url: &str,
        algorithm: AlgorithmType,
    ) -> Result<Option<String>>;

    /// Returns the original URL of the live mapping for (`algorithm`, `short_url`).
    /// Missing or expired mappings yield `None`.
    async fn get_original_url(
        &self,
        short_url: &str,
        algorithm: AlgorithmType,
    ) -> Result<Option<String>>;

    /// Removes every stored mapping.
    async fn reset(&self) -> Result<()>;
}

/// Runs `body` between [`UrlRepository::initialize`] and [`UrlRepository::finalize`].
///
/// The repository is finalized whether `body` succeeds or fails. An error
/// from `body` takes precedence over an error raised while finalizing.
pub async fn scoped<R, F, Fut, T, E>(repository: &R, body: F) -> std::result::Result<T, E>
where
    R: UrlRepository + ?Sized,
    F: FnOnce() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    E: From<StorageError>,
{
    repository.initialize().await?;

    let outcome = body().await;
    let finalized = repository.finalize().await;

    let value = outcome?;
    finalized?;
    Ok(value)
}
