use crate::truncate;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::debug;
use urlshortener_core::{AlgorithmType, ShorteningAlgorithm};

/// Standard base64 of the URL bytes, truncated.
///
/// Every URL sharing the same first six bytes (e.g. `https:`) maps to the
/// same token, so collisions are the norm rather than the exception.
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64Algorithm;

impl ShorteningAlgorithm for Base64Algorithm {
    fn algorithm_type(&self) -> AlgorithmType {
        AlgorithmType::Base64
    }

    fn shorten(&self, url: &str) -> String {
        debug!(url, "shortening url with base64");
        truncate(STANDARD.encode(url.as_bytes()))
    }
}
