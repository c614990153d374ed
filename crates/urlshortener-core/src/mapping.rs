use crate::algorithm::AlgorithmType;
use crate::error::{CoreError, StorageError};
use jiff::{SignedDuration, Timestamp};

/// How long a mapping stays live after it is saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpirationOffset(SignedDuration);

impl ExpirationOffset {
    /// One hour.
    pub const DEFAULT_SECONDS: i64 = 3600;

    /// Creates an offset of `seconds`, which must be strictly positive.
    pub fn from_secs(seconds: i64) -> Result<Self, CoreError> {
        if seconds <= 0 {
            return Err(CoreError::InvalidExpirationOffset(seconds));
        }
        Ok(Self(SignedDuration::from_secs(seconds)))
    }

    pub fn as_secs(&self) -> i64 {
        self.0.as_secs()
    }

    /// Computes the expiration time of a record created at `created_at`.
    pub fn expires_at(&self, created_at: Timestamp) -> Result<Timestamp, StorageError> {
        created_at.checked_add(self.0).map_err(|e| {
            StorageError::InvalidData(format!(
                "expiration time overflows for creation time {created_at}: {e}"
            ))
        })
    }
}

impl Default for ExpirationOffset {
    fn default() -> Self {
        Self(SignedDuration::from_secs(Self::DEFAULT_SECONDS))
    }
}

/// A persisted URL mapping.
///
/// At most one mapping exists per (`algorithm`, `original_url`). The
/// `short_url` is not unique: truncated tokens of different URLs may collide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlMapping {
    pub algorithm: AlgorithmType,
    pub original_url: String,
    pub short_url: String,
    pub creation_time: Timestamp,
    pub expiration_time: Timestamp,
}

impl UrlMapping {
    /// Builds a mapping created at `now`, expiring `offset` later.
    ///
    /// Both timestamps are truncated to whole seconds, the resolution the
    /// storage engines persist.
    pub fn issue(
        algorithm: AlgorithmType,
        original_url: impl Into<String>,
        short_url: impl Into<String>,
        now: Timestamp,
        offset: ExpirationOffset,
    ) -> Result<Self, StorageError> {
        let creation_time = Timestamp::from_second(now.as_second())
            .map_err(|e| StorageError::InvalidData(format!("invalid creation time: {e}")))?;
        let expiration_time = offset.expires_at(creation_time)?;

        Ok(Self {
            algorithm,
            original_url: original_url.into(),
            short_url: short_url.into(),
            creation_time,
            expiration_time,
        })
    }

    /// A mapping is live while its expiration time is in the future.
    pub fn is_live(&self, now: Timestamp) -> bool {
        self.expiration_time > now
    }
}
