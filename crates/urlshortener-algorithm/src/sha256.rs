use crate::truncate;
use sha2::{Digest, Sha256};
use tracing::debug;
use urlshortener_core::{AlgorithmType, ShorteningAlgorithm};

/// Hex-encoded SHA-256 digest of the URL bytes, truncated.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Algorithm;

impl ShorteningAlgorithm for Sha256Algorithm {
    fn algorithm_type(&self) -> AlgorithmType {
        AlgorithmType::Sha256
    }

    fn shorten(&self, url: &str) -> String {
        debug!(url, "shortening url with sha256");
        let digest = Sha256::digest(url.as_bytes());
        truncate(hex::encode(digest))
    }
}
