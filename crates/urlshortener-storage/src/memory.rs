use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;
use urlshortener_core::repository::{Result, UrlRepository};
use urlshortener_core::{AlgorithmType, Clock, ExpirationOffset, StorageError, SystemClock, UrlMapping};

const NAME: &str = "InMemoryRepository";

/// Uniqueness key of a mapping.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MappingKey {
    algorithm: AlgorithmType,
    original_url: String,
}

/// In-memory storage entry for a URL mapping.
#[derive(Debug, Clone)]
struct Entry {
    mapping: UrlMapping,
    /// Write order, used to break ties between colliding short URLs.
    revision: u64,
}

/// In-memory implementation of [`UrlRepository`] using DashMap.
///
/// Upserts are a single insert on the (algorithm, original URL) key, so
/// concurrent saves of the same pair never produce two records. Expired
/// records stay in the map and are only skipped by reads.
pub struct InMemoryRepository {
    storage: DashMap<MappingKey, Entry>,
    expiration_offset: ExpirationOffset,
    clock: Arc<dyn Clock>,
    initialized: AtomicBool,
    revision: AtomicU64,
}

impl InMemoryRepository {
    /// Creates a new in-memory repository driven by the system clock.
    pub fn new(expiration_offset: ExpirationOffset) -> Self {
        Self::with_clock(expiration_offset, SystemClock)
    }

    /// Creates a new in-memory repository reading time from `clock`.
    pub fn with_clock(expiration_offset: ExpirationOffset, clock: impl Clock) -> Self {
        Self {
            storage: DashMap::new(),
            expiration_offset,
            clock: Arc::new(clock),
            initialized: AtomicBool::new(false),
            revision: AtomicU64::new(0),
        }
    }

    /// Number of stored records, live or expired.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    fn ensure_initialized(&self) -> Result<()> {
        if self.initialized.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(StorageError::Uninitialized(NAME))
        }
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new(ExpirationOffset::default())
    }
}

impl std::fmt::Debug for InMemoryRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(NAME)
            .field("records", &self.storage.len())
            .field("expiration_offset", &self.expiration_offset)
            .field("initialized", &self.initialized.load(Ordering::Relaxed))
            .finish()
    }
}

#[async_trait]
impl UrlRepository for InMemoryRepository {
    async fn initialize(&self) -> Result<()> {
        if self.initialized.swap(true, Ordering::AcqRel) {
            debug!("{NAME} is already initialized");
        } else {
            debug!("initialized {NAME}");
        }
        Ok(())
    }

    async fn finalize(&self) -> Result<()> {
        if self.initialized.swap(false, Ordering::AcqRel) {
            debug!("finalized {NAME}");
        }
        Ok(())
    }

    async fn save_url_mapping(
        &self,
        original_url: &str,
        short_url: &str,
        algorithm: AlgorithmType,
    ) -> Result<()> {
        self.ensure_initialized()?;

        let mapping = UrlMapping::issue(
            algorithm,
            original_url,
            short_url,
            self.clock.now(),
            self.expiration_offset,
        )?;
        debug!(?mapping, "storing url mapping");

        let key = MappingKey {
            algorithm,
            original_url: original_url.to_owned(),
        };
        let entry = Entry {
            mapping,
            revision: self.revision.fetch_add(1, Ordering::Relaxed),
        };
        self.storage.insert(key, entry);
        Ok(())
    }

    async fn get_short_url(
        &self,
        original_url: &str,
        algorithm: AlgorithmType,
    ) -> Result<Option<String>> {
        self.ensure_initialized()?;
        debug!(original_url, %algorithm, "retrieving short url");

        let key = MappingKey {
            algorithm,
            original_url: original_url.to_owned(),
        };
        let now = self.clock.now();

        let short_url = self
            .storage
            .get(&key)
            .filter(|entry| entry.mapping.is_live(now))
            .map(|entry| entry.mapping.short_url.clone());

        if short_url.is_none() {
            debug!(original_url, %algorithm, "url not found or expired");
        }
        Ok(short_url)
    }

    async fn get_original_url(
        &self,
        short_url: &str,
        algorithm: AlgorithmType,
    ) -> Result<Option<String>> {
        self.ensure_initialized()?;
        debug!(short_url, %algorithm, "retrieving original url");

        let now = self.clock.now();

        // Colliding short URLs resolve to the most recently saved live mapping.
        let original_url = self
            .storage
            .iter()
            .filter(|entry| {
                let mapping = &entry.mapping;
                mapping.algorithm == algorithm
                    && mapping.short_url == short_url
                    && mapping.is_live(now)
            })
            .max_by_key(|entry| (entry.mapping.creation_time, entry.revision))
            .map(|entry| entry.mapping.original_url.clone());

        if original_url.is_none() {
            debug!(short_url, %algorithm, "url not found or expired");
        }
        Ok(original_url)
    }

    async fn reset(&self) -> Result<()> {
        self.ensure_initialized()?;
        debug!("resetting repository");
        self.storage.clear();
        Ok(())
    }
}
