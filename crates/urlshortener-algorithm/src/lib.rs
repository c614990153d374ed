//! Built-in shortening strategies and the registry that hands them out.

pub mod base_58;
pub mod base_64;
pub mod factory;
pub mod sha256;

pub use base_58::Base58Algorithm;
pub use base_64::Base64Algorithm;
pub use factory::AlgorithmFactory;
pub use sha256::Sha256Algorithm;
pub use urlshortener_core::{AlgorithmType, ShorteningAlgorithm};

/// Length of every token produced by the built-in strategies.
pub const TOKEN_LENGTH: usize = 8;

/// Cuts an ASCII token down to [`TOKEN_LENGTH`] characters.
fn truncate(mut token: String) -> String {
    token.truncate(TOKEN_LENGTH);
    token
}
