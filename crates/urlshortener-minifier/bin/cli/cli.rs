use clap::{Parser, ValueEnum};
use std::fmt::{Display, Formatter};
use std::path::Path;
use thiserror::Error;
use urlshortener_core::{AlgorithmType, CoreError, ExpirationOffset};
use urlshortener_minifier::origin::is_absolute_url;
use urlshortener_telemetry::{LogFormat, TelemetryConfig};

pub const STORAGE_BACKEND_ENV: &str = "URLSHORTENER_STORAGE_BACKEND";
pub const MYSQL_DSN_ENV: &str = "URLSHORTENER_MYSQL_DSN";
pub const URL_TABLE_ENV: &str = "URLSHORTENER_URL_TABLE";
pub const EXPIRATION_OFFSET_ENV: &str = "URLSHORTENER_EXPIRATION_OFFSET";
pub const ALGORITHM_ENV: &str = "URLSHORTENER_SHORTENING_ALGORITHM";
pub const FIXED_DOMAIN_ENV: &str = "URLSHORTENER_FIXED_DOMAIN";
pub const LOG_FORMAT_ENV: &str = "URLSHORTENER_LOG_FORMAT";

pub const DEFAULT_MYSQL_DSN: &str = "mysql://localhost:3306/urlshortener";
pub const DEFAULT_URL_TABLE: &str = "url_mappings";
pub const DEFAULT_ALGORITHM: &str = "base-64";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "mysql")]
    Mysql,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::Mysql => write!(f, "mysql"),
        }
    }
}

/// Loads environment overrides from `path`, or from the first `.env` found in
/// the current directory and its ancestors. A missing file is not an error.
pub fn load_env_file(path: Option<&Path>) -> Result<(), dotenvy::Error> {
    let loaded = match path {
        Some(path) => dotenvy::from_path(path),
        None => dotenvy::dotenv().map(|_| ()),
    };

    match loaded {
        Err(err) if err.not_found() => Ok(()),
        other => other,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionsError {
    #[error("Please specify either --minify or --expand option")]
    NothingToDo,
    #[error("'{0}' is not a valid URL")]
    InvalidUrl(String),
}

#[derive(Debug, Parser)]
#[command(name = "urlshortener", about = "Url shortener tool")]
pub struct CLI {
    /// URL to shorten
    #[arg(short = 'm', long = "minify", value_name = "URL")]
    pub url_to_minify: Option<String>,

    /// URL to expand
    #[arg(short = 'e', long = "expand", value_name = "URL")]
    pub url_to_expand: Option<String>,

    /// Print debugging information
    #[arg(short, long)]
    pub verbose: bool,

    #[arg(long, env = LOG_FORMAT_ENV, default_value = "text")]
    pub log_format: LogFormat,

    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::Mysql
    )]
    pub storage: StorageBackendArg,

    #[arg(long, env = MYSQL_DSN_ENV, default_value = DEFAULT_MYSQL_DSN)]
    pub mysql_dsn: String,

    #[arg(long, env = URL_TABLE_ENV, default_value = DEFAULT_URL_TABLE)]
    pub url_table: String,

    /// Seconds a mapping stays valid after it is saved
    #[arg(
        long,
        env = EXPIRATION_OFFSET_ENV,
        default_value_t = ExpirationOffset::DEFAULT_SECONDS,
        value_parser = clap::value_parser!(i64).range(1..)
    )]
    pub expiration_offset: i64,

    #[arg(long, env = ALGORITHM_ENV, default_value = DEFAULT_ALGORITHM)]
    pub algorithm: AlgorithmType,

    /// Domain prefixed to every new short URL instead of the URL's own origin
    #[arg(long, env = FIXED_DOMAIN_ENV)]
    pub fixed_domain: Option<String>,
}

impl CLI {
    pub fn url_to_minify(&self) -> Option<&str> {
        self.url_to_minify.as_deref().filter(|url| !url.is_empty())
    }

    pub fn url_to_expand(&self) -> Option<&str> {
        self.url_to_expand.as_deref().filter(|url| !url.is_empty())
    }

    /// Checks that there is something to do and that every given URL has a
    /// scheme and a host.
    pub fn validate(&self) -> Result<(), OptionsError> {
        let minify = self.url_to_minify();
        let expand = self.url_to_expand();

        if minify.is_none() && expand.is_none() {
            return Err(OptionsError::NothingToDo);
        }

        for url in minify.into_iter().chain(expand) {
            if !is_absolute_url(url) {
                return Err(OptionsError::InvalidUrl(url.to_string()));
            }
        }

        Ok(())
    }

    pub fn expiration_offset(&self) -> Result<ExpirationOffset, CoreError> {
        ExpirationOffset::from_secs(self.expiration_offset)
    }

    pub fn telemetry(&self) -> TelemetryConfig {
        TelemetryConfig::builder()
            .verbose(self.verbose)
            .format(self.log_format)
            .build()
    }
}
