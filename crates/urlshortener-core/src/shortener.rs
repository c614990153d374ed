use crate::algorithm::ShorteningAlgorithm;
use crate::error::ShortenerError;
use async_trait::async_trait;
use std::fmt::Display;

type Result<T> = std::result::Result<T, ShortenerError>;

/// Outcome of expanding a short URL.
///
/// A missing or expired mapping is a regular outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expansion {
    /// The original URL behind the short URL.
    Found(String),
    /// No live mapping exists for the short URL.
    NotFound,
}

impl Expansion {
    /// Text shown in place of an original URL that could not be found.
    pub const NOT_FOUND: &'static str = "not found or expired";

    pub fn is_found(&self) -> bool {
        matches!(self, Expansion::Found(_))
    }

    pub fn into_option(self) -> Option<String> {
        match self {
            Expansion::Found(url) => Some(url),
            Expansion::NotFound => None,
        }
    }
}

impl From<Option<String>> for Expansion {
    fn from(value: Option<String>) -> Self {
        value.map_or(Expansion::NotFound, Expansion::Found)
    }
}

impl Display for Expansion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expansion::Found(url) => f.write_str(url),
            Expansion::NotFound => f.write_str(Self::NOT_FOUND),
        }
    }
}

#[async_trait]
pub trait Shortener: Send + Sync + 'static {
    /// Returns the short URL for `url`, reusing a live mapping when one exists.
    ///
    /// `algorithm` is optional so that a missing strategy is reported as
    /// [`ShortenerError::NoAlgorithm`] instead of being unrepresentable.
    async fn minify(
        &self,
        url: &str,
        algorithm: Option<&dyn ShorteningAlgorithm>,
    ) -> Result<String>;

    /// Looks up the original URL behind `short_url`.
    async fn expand(
        &self,
        short_url: &str,
        algorithm: Option<&dyn ShorteningAlgorithm>,
    ) -> Result<Expansion>;
}
