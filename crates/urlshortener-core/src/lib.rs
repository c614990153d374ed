//! Core types and traits for the URL shortener.
//!
//! This crate provides the contracts shared by the shortening strategies,
//! the persistence engines and the orchestration layer.

pub mod algorithm;
pub mod clock;
pub mod error;
pub mod mapping;
pub mod repository;
pub mod shortener;

pub use algorithm::{AlgorithmType, ShorteningAlgorithm};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{CoreError, ShortenerError, StorageError};
pub use mapping::{ExpirationOffset, UrlMapping};
pub use repository::{scoped, UrlRepository};
pub use shortener::{Expansion, Shortener};
