use crate::error::CoreError;
use std::fmt::Display;
use std::str::FromStr;

/// Identifies a shortening strategy.
///
/// The string identifier of each variant is part of the persistence key,
/// so it must never change once records have been written with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlgorithmType {
    Base64,
    Sha256,
    Base58,
}

impl AlgorithmType {
    /// Every known algorithm type.
    pub const ALL: [AlgorithmType; 3] = [
        AlgorithmType::Base64,
        AlgorithmType::Sha256,
        AlgorithmType::Base58,
    ];

    /// Returns the stable identifier used as a storage key component.
    pub fn as_str(&self) -> &'static str {
        match self {
            AlgorithmType::Base64 => "base-64",
            AlgorithmType::Sha256 => "sha256",
            AlgorithmType::Base58 => "base-58",
        }
    }
}

impl Display for AlgorithmType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlgorithmType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| CoreError::UnsupportedAlgorithm(s.to_string()))
    }
}

/// A strategy that maps a URL to a short token.
///
/// Implementations must be pure: the same input always yields the same
/// bounded-length token, and nothing is stored.
pub trait ShorteningAlgorithm: Send + Sync + 'static {
    /// The type tag of this strategy.
    fn algorithm_type(&self) -> AlgorithmType;

    /// Computes the short token for `url`.
    fn shorten(&self, url: &str) -> String;
}

impl std::fmt::Debug for dyn ShorteningAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ShorteningAlgorithm")
            .field(&self.algorithm_type())
            .finish()
    }
}
