mod cli;

use crate::cli::{StorageBackendArg, CLI};
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};
use urlshortener_algorithm::AlgorithmFactory;
use urlshortener_core::{scoped, ShortenerError, ShorteningAlgorithm, UrlRepository};
use urlshortener_minifier::{Shortener, UrlShortener};
use urlshortener_storage::{InMemoryRepository, MySqlRepository, MySqlSettings};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // the .env file is optional, but a malformed one is reported
    let dotenv_error = cli::load_env_file(None).err();

    let config = CLI::parse();
    urlshortener_telemetry::init(&config.telemetry())?;
    if let Some(err) = dotenv_error {
        warn!(error = %err, "failed to load .env file");
    }
    config.validate()?;

    let expiration_offset = config.expiration_offset()?;
    let algorithm = AlgorithmFactory::global().get(config.algorithm)?;

    info!(
        storage_backend = %config.storage,
        algorithm = %config.algorithm,
        expiration_offset = expiration_offset.as_secs(),
        fixed_domain = ?config.fixed_domain,
        "starting url shortener"
    );

    match config.storage {
        StorageBackendArg::InMemory => {
            run(&config, InMemoryRepository::new(expiration_offset), algorithm).await?;
        }
        StorageBackendArg::Mysql => {
            let settings = MySqlSettings::builder()
                .database_url(config.mysql_dsn.clone())
                .table(config.url_table.clone())
                .expiration_offset(expiration_offset)
                .build();
            run(&config, MySqlRepository::new(settings)?, algorithm).await?;
        }
    }

    Ok(())
}

async fn run<R: UrlRepository>(
    config: &CLI,
    repository: R,
    algorithm: Arc<dyn ShorteningAlgorithm>,
) -> Result<(), ShortenerError> {
    let shortener = UrlShortener::new(repository).with_fixed_domain(config.fixed_domain.clone());
    if let Some(domain) = shortener.fixed_domain() {
        if !domain.ends_with('/') {
            warn!(domain, "fixed domain has no trailing separator, tokens are appended as is");
        }
    }

    scoped(shortener.repository(), || async {
        if let Some(url) = config.url_to_minify() {
            let short_url = shortener.minify(url, Some(&*algorithm)).await?;
            println!("{url} -> {short_url}");
        }

        if let Some(url) = config.url_to_expand() {
            let original_url = shortener.expand(url, Some(&*algorithm)).await?;
            println!("{url} -> {original_url}");
        }

        Ok::<(), ShortenerError>(())
    })
    .await
}
