use async_trait::async_trait;
use sha2::{Digest, Sha256};
use sqlx::mysql::MySqlPoolOptions;
use sqlx::{MySqlPool, Row};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use typed_builder::TypedBuilder;
use urlshortener_core::repository::{Result, UrlRepository};
use urlshortener_core::{AlgorithmType, Clock, ExpirationOffset, StorageError, SystemClock, UrlMapping};

const NAME: &str = "MySqlRepository";

/// Connection and schema settings for [`MySqlRepository`].
#[derive(Debug, Clone, TypedBuilder)]
pub struct MySqlSettings {
    #[builder(setter(into))]
    database_url: String,
    #[builder(default = "url_mappings".to_string(), setter(into))]
    table: String,
    #[builder(default)]
    expiration_offset: ExpirationOffset,
    #[builder(default = 5)]
    max_connections: u32,
}

impl MySqlSettings {
    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn expiration_offset(&self) -> ExpirationOffset {
        self.expiration_offset
    }
}

/// SQL statements bound to the configured table name.
#[derive(Debug)]
struct Statements {
    create_table: String,
    upsert: String,
    select_short_url: String,
    select_original_url: String,
    delete_all: String,
}

impl Statements {
    fn for_table(table: &str) -> Self {
        // URLs are unbounded, so keys go through fixed-width SHA-256 columns.
        // utf8mb4_0900_bin is NO PAD: case and trailing spaces are significant.
        let create_table = format!(
            r#"
            CREATE TABLE IF NOT EXISTS `{table}` (
                id BIGINT UNSIGNED NOT NULL AUTO_INCREMENT,
                algorithm VARCHAR(16) CHARACTER SET ascii NOT NULL,
                original_url MEDIUMTEXT CHARACTER SET utf8mb4 COLLATE utf8mb4_0900_bin NOT NULL,
                original_url_hash BINARY(32) NOT NULL,
                short_url MEDIUMTEXT CHARACTER SET utf8mb4 COLLATE utf8mb4_0900_bin NOT NULL,
                short_url_hash BINARY(32) NOT NULL,
                creation_time BIGINT NOT NULL,
                expiration_time BIGINT NOT NULL,
                PRIMARY KEY (id),
                UNIQUE KEY uq_algorithm_original_url (algorithm, original_url_hash),
                KEY idx_algorithm_short_url (algorithm, short_url_hash)
            )
            "#
        );

        let upsert = format!(
            r#"
            INSERT INTO `{table}` (
                algorithm,
                original_url,
                original_url_hash,
                short_url,
                short_url_hash,
                creation_time,
                expiration_time
            )
            VALUES (?, ?, ?, ?, ?, ?, ?) AS new
            ON DUPLICATE KEY UPDATE
                short_url = new.short_url,
                short_url_hash = new.short_url_hash,
                creation_time = new.creation_time,
                expiration_time = new.expiration_time
            "#
        );

        let select_short_url = format!(
            r#"
            SELECT short_url
            FROM `{table}`
            WHERE algorithm = ?
              AND original_url_hash = ?
              AND original_url = ?
              AND expiration_time > ?
            LIMIT 1
            "#
        );

        let select_original_url = format!(
            r#"
            SELECT original_url
            FROM `{table}`
            WHERE algorithm = ?
              AND short_url_hash = ?
              AND short_url = ?
              AND expiration_time > ?
            ORDER BY creation_time DESC, id DESC
            LIMIT 1
            "#
        );

        let delete_all = format!("DELETE FROM `{table}`");

        Self {
            create_table,
            upsert,
            select_short_url,
            select_original_url,
            delete_all,
        }
    }
}

/// MySQL implementation of the repository contract.
///
/// [`UrlRepository::initialize`] opens the pool and creates the table when it
/// does not exist yet. Saving is a single `INSERT .. ON DUPLICATE KEY UPDATE`
/// on the (algorithm, original_url hash) unique key. Reads only return records
/// whose expiration time is still ahead of the clock.
pub struct MySqlRepository {
    settings: MySqlSettings,
    statements: Statements,
    pool: RwLock<Option<MySqlPool>>,
    clock: Arc<dyn Clock>,
}

impl MySqlRepository {
    /// Creates a closed repository. Fails if the table name is not a plain identifier.
    pub fn new(settings: MySqlSettings) -> Result<Self> {
        Self::with_clock(settings, SystemClock)
    }

    /// Creates a closed repository reading time from `clock`.
    pub fn with_clock(settings: MySqlSettings, clock: impl Clock) -> Result<Self> {
        validate_table_name(&settings.table)?;

        Ok(Self {
            statements: Statements::for_table(&settings.table),
            settings,
            pool: RwLock::new(None),
            clock: Arc::new(clock),
        })
    }

    pub fn settings(&self) -> &MySqlSettings {
        &self.settings
    }

    async fn pool(&self) -> Result<MySqlPool> {
        self.pool
            .read()
            .await
            .clone()
            .ok_or(StorageError::Uninitialized(NAME))
    }

    fn now_unix_seconds(&self) -> i64 {
        self.clock.now().as_second()
    }
}

impl std::fmt::Debug for MySqlRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(NAME)
            .field("table", &self.settings.table)
            .field("expiration_offset", &self.settings.expiration_offset)
            .finish_non_exhaustive()
    }
}

fn validate_table_name(table: &str) -> Result<()> {
    let valid = !table.is_empty()
        && table.len() <= 64
        && table
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid {
        Ok(())
    } else {
        Err(StorageError::Operation(format!(
            "table name must be 1-64 alphanumeric characters or underscores: '{table}'"
        )))
    }
}

/// SHA-256 of a URL, the fixed-width key column stored next to it.
fn url_hash(url: &str) -> Vec<u8> {
    Sha256::digest(url.as_bytes()).to_vec()
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

#[async_trait]
impl UrlRepository for MySqlRepository {
    async fn initialize(&self) -> Result<()> {
        let mut pool = self.pool.write().await;
        if pool.is_some() {
            debug!("{NAME} is already initialized");
            return Ok(());
        }

        debug!("opening mysql connection pool");
        let opened = MySqlPoolOptions::new()
            .max_connections(self.settings.max_connections)
            .connect(&self.settings.database_url)
            .await
            .map_err(map_sqlx_error)?;

        debug!(table = %self.settings.table, "ensuring url mapping table exists");
        if let Err(err) = sqlx::query(&self.statements.create_table)
            .execute(&opened)
            .await
        {
            opened.close().await;
            return Err(map_sqlx_error(err));
        }

        *pool = Some(opened);
        Ok(())
    }

    async fn finalize(&self) -> Result<()> {
        if let Some(pool) = self.pool.write().await.take() {
            debug!("closing mysql connection pool");
            pool.close().await;
        }
        Ok(())
    }

    async fn save_url_mapping(
        &self,
        original_url: &str,
        short_url: &str,
        algorithm: AlgorithmType,
    ) -> Result<()> {
        let pool = self.pool().await?;

        let mapping = UrlMapping::issue(
            algorithm,
            original_url,
            short_url,
            self.clock.now(),
            self.settings.expiration_offset,
        )?;
        debug!(?mapping, "storing url mapping");

        sqlx::query(&self.statements.upsert)
            .bind(mapping.algorithm.as_str())
            .bind(&mapping.original_url)
            .bind(url_hash(&mapping.original_url))
            .bind(&mapping.short_url)
            .bind(url_hash(&mapping.short_url))
            .bind(mapping.creation_time.as_second())
            .bind(mapping.expiration_time.as_second())
            .execute(&pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn get_short_url(
        &self,
        original_url: &str,
        algorithm: AlgorithmType,
    ) -> Result<Option<String>> {
        let pool = self.pool().await?;
        debug!(original_url, %algorithm, "retrieving short url");

        let row = sqlx::query(&self.statements.select_short_url)
            .bind(algorithm.as_str())
            .bind(url_hash(original_url))
            .bind(original_url)
            .bind(self.now_unix_seconds())
            .fetch_optional(&pool)
            .await
            .map_err(map_sqlx_error)?;

        let Some(row) = row else {
            debug!(original_url, %algorithm, "url not found or expired");
            return Ok(None);
        };

        let short_url: String = row.try_get("short_url").map_err(map_sqlx_error)?;
        Ok(Some(short_url))
    }

    async fn get_original_url(
        &self,
        short_url: &str,
        algorithm: AlgorithmType,
    ) -> Result<Option<String>> {
        let pool = self.pool().await?;
        debug!(short_url, %algorithm, "retrieving original url");

        let row = sqlx::query(&self.statements.select_original_url)
            .bind(algorithm.as_str())
            .bind(url_hash(short_url))
            .bind(short_url)
            .bind(self.now_unix_seconds())
            .fetch_optional(&pool)
            .await
            .map_err(map_sqlx_error)?;

        let Some(row) = row else {
            debug!(short_url, %algorithm, "url not found or expired");
            return Ok(None);
        };

        let original_url: String = row.try_get("original_url").map_err(map_sqlx_error)?;
        Ok(Some(original_url))
    }

    async fn reset(&self) -> Result<()> {
        let pool = self.pool().await?;
        debug!("resetting repository");

        sqlx::query(&self.statements.delete_all)
            .execute(&pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }
}
