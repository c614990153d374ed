use crate::truncate;
use sha2::{Digest, Sha256};
use tracing::debug;
use urlshortener_core::{AlgorithmType, ShorteningAlgorithm};

/// Base58 (bitcoin alphabet) of the URL's SHA-256 digest, truncated.
///
/// Base58 is a big-number encoding, quadratic in its input. Encoding the
/// 32-byte digest instead of the URL bytes keeps the cost constant for
/// long URLs.
#[derive(Debug, Clone, Copy, Default)]
pub struct Base58Algorithm;

impl ShorteningAlgorithm for Base58Algorithm {
    fn algorithm_type(&self) -> AlgorithmType {
        AlgorithmType::Base58
    }

    fn shorten(&self, url: &str) -> String {
        debug!(url, "shortening url with base58");
        let digest = Sha256::digest(url.as_bytes());
        truncate(bs58::encode(digest).into_string())
    }
}
