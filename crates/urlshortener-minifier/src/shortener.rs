use crate::origin::origin_of;
use async_trait::async_trait;
use std::borrow::Cow;
use std::sync::Arc;
use tracing::debug;
use urlshortener_core::{Expansion, Shortener, ShortenerError, ShorteningAlgorithm, UrlRepository};

type Result<T> = std::result::Result<T, ShortenerError>;

/// A concrete implementation of the [`Shortener`] trait.
///
/// This service wraps a [`UrlRepository`] and handles:
/// - Reuse of live mappings, so minifying twice never recomputes or rewrites
/// - Composition of the short URL from a domain and the algorithm's token
/// - Input validation
///
/// The domain is the fixed domain when one is configured, otherwise the
/// `scheme://authority/` of the URL being minified. The URL is only checked
/// for a scheme and host when no live mapping exists and no fixed domain is
/// set, so a mapping stored for a malformed URL is still returned as is.
#[derive(Debug)]
pub struct UrlShortener<R> {
    repository: Arc<R>,
    fixed_domain: Option<String>,
}

impl<R> Clone for UrlShortener<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            fixed_domain: self.fixed_domain.clone(),
        }
    }
}

impl<R: UrlRepository> UrlShortener<R> {
    /// Creates a new `UrlShortener` deriving the domain from each URL.
    pub fn new(repository: R) -> Self {
        Self::from_shared(Arc::new(repository))
    }

    /// Creates a new `UrlShortener` over a repository shared with other owners.
    pub fn from_shared(repository: Arc<R>) -> Self {
        Self {
            repository,
            fixed_domain: None,
        }
    }

    /// Uses `domain` verbatim as the prefix of every new short URL.
    ///
    /// The domain should end with a separator (e.g. `https://sho.rt/`). An
    /// empty domain counts as no fixed domain.
    pub fn with_fixed_domain(mut self, domain: Option<impl Into<String>>) -> Self {
        self.fixed_domain = domain.map(Into::into).filter(|d| !d.is_empty());
        self
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn fixed_domain(&self) -> Option<&str> {
        self.fixed_domain.as_deref()
    }

    /// Determines the domain a new short URL is composed with.
    fn domain_for<'a>(&'a self, url: &str) -> Result<Cow<'a, str>> {
        if let Some(domain) = &self.fixed_domain {
            return Ok(Cow::Borrowed(domain.as_str()));
        }

        origin_of(url)
            .map(Cow::Owned)
            .ok_or_else(|| ShortenerError::InvalidUrl(url.to_string()))
    }

    /// Computes, stores and returns a fresh short URL for `url`.
    async fn minify_and_save(
        &self,
        url: &str,
        algorithm: &dyn ShorteningAlgorithm,
    ) -> Result<String> {
        let domain = self.domain_for(url)?;
        let token = algorithm.shorten(url);
        let short_url = format!("{domain}{token}");

        debug!(url, short_url = %short_url, "url minified, storing it");
        self.repository
            .save_url_mapping(url, &short_url, algorithm.algorithm_type())
            .await?;

        Ok(short_url)
    }
}

#[async_trait]
impl<R: UrlRepository> Shortener for UrlShortener<R> {
    async fn minify(
        &self,
        url: &str,
        algorithm: Option<&dyn ShorteningAlgorithm>,
    ) -> Result<String> {
        let algorithm = algorithm.ok_or(ShortenerError::NoAlgorithm)?;
        if url.is_empty() {
            return Err(ShortenerError::NoUrl);
        }

        let algorithm_type = algorithm.algorithm_type();
        debug!(url, algorithm = %algorithm_type, "minifying url");

        if let Some(existing) = self.repository.get_short_url(url, algorithm_type).await? {
            debug!(url, short_url = %existing, "url already minified, returning it");
            return Ok(existing);
        }

        debug!(url, "url not minified yet");
        self.minify_and_save(url, algorithm).await
    }

    async fn expand(
        &self,
        short_url: &str,
        algorithm: Option<&dyn ShorteningAlgorithm>,
    ) -> Result<Expansion> {
        let algorithm = algorithm.ok_or(ShortenerError::NoAlgorithm)?;
        if short_url.is_empty() {
            return Err(ShortenerError::NoUrl);
        }

        let algorithm_type = algorithm.algorithm_type();
        debug!(short_url, algorithm = %algorithm_type, "expanding url");

        let original = self
            .repository
            .get_original_url(short_url, algorithm_type)
            .await?;
        Ok(Expansion::from(original))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::{SignedDuration, Timestamp};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use urlshortener_algorithm::{Base58Algorithm, Base64Algorithm, Sha256Algorithm};
    use urlshortener_core::repository;
    use urlshortener_core::{AlgorithmType, ExpirationOffset, ManualClock, StorageError};
    use urlshortener_storage::InMemoryRepository;

    /// Counts calls going through to an in-memory repository.
    #[derive(Debug)]
    struct CountingRepository {
        inner: InMemoryRepository,
        short_lookups: AtomicUsize,
        original_lookups: AtomicUsize,
        saves: AtomicUsize,
    }

    impl CountingRepository {
        fn new(inner: InMemoryRepository) -> Self {
            Self {
                inner,
                short_lookups: AtomicUsize::new(0),
                original_lookups: AtomicUsize::new(0),
                saves: AtomicUsize::new(0),
            }
        }

        fn short_lookups(&self) -> usize {
            self.short_lookups.load(Ordering::SeqCst)
        }

        fn original_lookups(&self) -> usize {
            self.original_lookups.load(Ordering::SeqCst)
        }

        fn saves(&self) -> usize {
            self.saves.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl UrlRepository for CountingRepository {
        async fn initialize(&self) -> repository::Result<()> {
            self.inner.initialize().await
        }

        async fn finalize(&self) -> repository::Result<()> {
            self.inner.finalize().await
        }

        async fn save_url_mapping(
            &self,
            original_url: &str,
            short_url: &str,
            algorithm: AlgorithmType,
        ) -> repository::Result<()> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            self.inner
                .save_url_mapping(original_url, short_url, algorithm)
                .await
        }

        async fn get_short_url(
            &self,
            original_url: &str,
            algorithm: AlgorithmType,
        ) -> repository::Result<Option<String>> {
            self.short_lookups.fetch_add(1, Ordering::SeqCst);
            self.inner.get_short_url(original_url, algorithm).await
        }

        async fn get_original_url(
            &self,
            short_url: &str,
            algorithm: AlgorithmType,
        ) -> repository::Result<Option<String>> {
            self.original_lookups.fetch_add(1, Ordering::SeqCst);
            self.inner.get_original_url(short_url, algorithm).await
        }

        async fn reset(&self) -> repository::Result<()> {
            self.inner.reset().await
        }
    }

    /// Counts invocations of a wrapped algorithm.
    #[derive(Debug, Default)]
    struct CountingAlgorithm<A> {
        inner: A,
        calls: AtomicUsize,
    }

    impl<A> CountingAlgorithm<A> {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl<A: ShorteningAlgorithm> ShorteningAlgorithm for CountingAlgorithm<A> {
        fn algorithm_type(&self) -> AlgorithmType {
            self.inner.algorithm_type()
        }

        fn shorten(&self, url: &str) -> String {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.shorten(url)
        }
    }

    const OFFSET_SECS: i64 = 3600;

    async fn test_shortener() -> (UrlShortener<CountingRepository>, ManualClock) {
        let clock = ManualClock::new(Timestamp::from_second(1_704_067_200).unwrap());
        let inner = InMemoryRepository::with_clock(
            ExpirationOffset::from_secs(OFFSET_SECS).unwrap(),
            clock.clone(),
        );
        let repository = CountingRepository::new(inner);
        repository.initialize().await.unwrap();
        (UrlShortener::new(repository), clock)
    }

    #[tokio::test]
    async fn minify_composes_origin_and_token() {
        let (shortener, _) = test_shortener().await;

        let short = shortener
            .minify("https://www.example.com/lorem/ipsum", Some(&Base64Algorithm))
            .await
            .unwrap();

        assert_eq!(short, "https://www.example.com/aHR0cHM6");
        assert_eq!(shortener.repository().saves(), 1);
        let stored = shortener
            .repository()
            .inner
            .get_short_url("https://www.example.com/lorem/ipsum", AlgorithmType::Base64)
            .await
            .unwrap();
        assert_eq!(stored.as_deref(), Some("https://www.example.com/aHR0cHM6"));
    }

    #[tokio::test]
    async fn minify_with_sha256() {
        let (shortener, _) = test_shortener().await;

        let short = shortener
            .minify("https://www.example.com/test?q=123", Some(&Sha256Algorithm))
            .await
            .unwrap();

        assert_eq!(short, "https://www.example.com/88cc9b88");
    }

    #[tokio::test]
    async fn minify_keeps_the_authority_as_written() {
        let (shortener, _) = test_shortener().await;

        for (url, expected) in [
            ("https://Example.COM:443/lorem", "https://Example.COM:443/3342fc4d"),
            ("https://a.io:99999/x", "https://a.io:99999/f6c38232"),
            ("http://a b.com/x", "http://a b.com/111f456d"),
        ] {
            let short = shortener.minify(url, Some(&Sha256Algorithm)).await.unwrap();
            assert_eq!(short, expected);
        }
    }

    #[tokio::test]
    async fn minify_twice_is_idempotent() {
        let (shortener, _) = test_shortener().await;
        let algorithm = CountingAlgorithm::<Sha256Algorithm>::default();
        let url = "https://www.example.com/test?q=123";

        let first = shortener.minify(url, Some(&algorithm)).await.unwrap();
        let second = shortener.minify(url, Some(&algorithm)).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(algorithm.calls(), 1);
        assert_eq!(shortener.repository().saves(), 1);
        assert_eq!(shortener.repository().short_lookups(), 2);
    }

    #[tokio::test]
    async fn minify_recomputes_after_expiry() {
        let (shortener, clock) = test_shortener().await;
        let algorithm = CountingAlgorithm::<Base58Algorithm>::default();
        let url = "https://www.example.com/test?q=123";

        let first = shortener.minify(url, Some(&algorithm)).await.unwrap();
        clock.advance(SignedDuration::from_secs(OFFSET_SECS));
        let second = shortener.minify(url, Some(&algorithm)).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(algorithm.calls(), 2);
        assert_eq!(shortener.repository().saves(), 2);
        assert_eq!(shortener.repository().inner.len(), 1);
    }

    #[tokio::test]
    async fn minify_returns_cached_url_without_validating() {
        let (shortener, _) = test_shortener().await;
        let algorithm = CountingAlgorithm::<Base64Algorithm>::default();
        shortener
            .repository()
            .inner
            .save_url_mapping("not-a-url-no-scheme", "https://sho.rt/bm90LWEt", AlgorithmType::Base64)
            .await
            .unwrap();

        let short = shortener
            .minify("not-a-url-no-scheme", Some(&algorithm))
            .await
            .unwrap();

        assert_eq!(short, "https://sho.rt/bm90LWEt");
        assert_eq!(algorithm.calls(), 0);
    }

    #[tokio::test]
    async fn minify_without_algorithm_fails_first() {
        let (shortener, _) = test_shortener().await;

        let err = shortener
            .minify("https://www.example.com/test?q=123", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ShortenerError::NoAlgorithm));

        let err = shortener.minify("", None).await.unwrap_err();
        assert!(matches!(err, ShortenerError::NoAlgorithm));

        let err = shortener.minify("not-a-url-no-scheme", None).await.unwrap_err();
        assert!(matches!(err, ShortenerError::NoAlgorithm));

        assert_eq!(shortener.repository().short_lookups(), 0);
        assert_eq!(shortener.repository().saves(), 0);
    }

    #[tokio::test]
    async fn minify_empty_url_fails_without_touching_repository() {
        let (shortener, _) = test_shortener().await;
        let algorithm = CountingAlgorithm::<Base64Algorithm>::default();

        let err = shortener.minify("", Some(&algorithm)).await.unwrap_err();

        assert!(matches!(err, ShortenerError::NoUrl));
        assert_eq!(shortener.repository().short_lookups(), 0);
        assert_eq!(shortener.repository().saves(), 0);
        assert_eq!(algorithm.calls(), 0);
    }

    #[tokio::test]
    async fn minify_url_without_domain_fails_after_lookup() {
        let (shortener, _) = test_shortener().await;
        let algorithm = CountingAlgorithm::<Base64Algorithm>::default();

        for url in ["https://", "not-a-url-no-scheme"] {
            let err = shortener.minify(url, Some(&algorithm)).await.unwrap_err();
            assert!(matches!(err, ShortenerError::InvalidUrl(_)), "{url}");
        }

        assert_eq!(shortener.repository().short_lookups(), 2);
        assert_eq!(shortener.repository().saves(), 0);
        assert_eq!(algorithm.calls(), 0);
    }

    #[tokio::test]
    async fn fixed_domain_is_used_verbatim_and_skips_validation() {
        let (shortener, _) = test_shortener().await;
        let shortener = shortener.with_fixed_domain(Some("https://sho.rt/"));

        let short = shortener
            .minify("https://www.example.com/lorem/ipsum", Some(&Sha256Algorithm))
            .await
            .unwrap();
        assert_eq!(short, "https://sho.rt/21812d51");

        let short = shortener
            .minify("not-a-url-no-scheme", Some(&Base64Algorithm))
            .await
            .unwrap();
        assert_eq!(short, "https://sho.rt/bm90LWEt");
    }

    #[tokio::test]
    async fn empty_fixed_domain_counts_as_unset() {
        let (shortener, _) = test_shortener().await;
        let shortener = shortener.with_fixed_domain(Some(""));

        assert_eq!(shortener.fixed_domain(), None);
        let err = shortener
            .minify("not-a-url-no-scheme", Some(&Base64Algorithm))
            .await
            .unwrap_err();
        assert!(matches!(err, ShortenerError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn minify_then_expand_round_trips() {
        let (shortener, _) = test_shortener().await;

        for url in [
            "https://www.example.com/lorem/ipsum",
            "http://localhost:8080/a/b?c=d",
            "https://example.org/",
        ] {
            let short = shortener.minify(url, Some(&Base58Algorithm)).await.unwrap();
            let expanded = shortener.expand(&short, Some(&Base58Algorithm)).await.unwrap();
            assert_eq!(expanded, Expansion::Found(url.to_string()));
        }
    }

    #[tokio::test]
    async fn expand_unknown_url_is_not_found() {
        let (shortener, _) = test_shortener().await;

        let expanded = shortener
            .expand("https://example.com/Hs2s1aD", Some(&Base64Algorithm))
            .await
            .unwrap();

        assert_eq!(expanded, Expansion::NotFound);
        assert_eq!(expanded.to_string(), "not found or expired");
        assert_eq!(shortener.repository().original_lookups(), 1);
    }

    #[tokio::test]
    async fn expand_after_expiry_is_not_found() {
        let (shortener, clock) = test_shortener().await;
        let url = "https://www.example.com/lorem/ipsum";

        let short = shortener.minify(url, Some(&Sha256Algorithm)).await.unwrap();
        clock.advance(SignedDuration::from_secs(OFFSET_SECS + 1));

        let expanded = shortener.expand(&short, Some(&Sha256Algorithm)).await.unwrap();
        assert_eq!(expanded, Expansion::NotFound);
    }

    #[tokio::test]
    async fn expand_with_other_algorithm_is_not_found() {
        let (shortener, _) = test_shortener().await;
        let url = "https://www.example.com/lorem/ipsum";

        let by_base64 = shortener.minify(url, Some(&Base64Algorithm)).await.unwrap();
        let by_sha256 = shortener.minify(url, Some(&Sha256Algorithm)).await.unwrap();
        assert_ne!(by_base64, by_sha256);
        assert_eq!(shortener.repository().inner.len(), 2);

        let expanded = shortener.expand(&by_base64, Some(&Sha256Algorithm)).await.unwrap();
        assert_eq!(expanded, Expansion::NotFound);
    }

    #[tokio::test]
    async fn expand_validates_arguments() {
        let (shortener, _) = test_shortener().await;

        let err = shortener.expand("https://a.io/x", None).await.unwrap_err();
        assert!(matches!(err, ShortenerError::NoAlgorithm));

        let err = shortener.expand("", Some(&Base64Algorithm)).await.unwrap_err();
        assert!(matches!(err, ShortenerError::NoUrl));

        assert_eq!(shortener.repository().original_lookups(), 0);
    }

    #[tokio::test]
    async fn uninitialized_repository_surfaces_storage_error() {
        let shortener = UrlShortener::new(InMemoryRepository::default());

        let err = shortener
            .minify("https://www.example.com/lorem/ipsum", Some(&Base64Algorithm))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ShortenerError::Storage(StorageError::Uninitialized(_))
        ));
    }
}
