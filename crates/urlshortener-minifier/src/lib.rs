//! URL shortener orchestration.
//!
//! This crate provides [`UrlShortener`], which combines a shortening
//! strategy with a [`UrlRepository`](urlshortener_core::UrlRepository) to
//! minify and expand URLs. Core types are re-exported from
//! `urlshortener_core`.

pub mod origin;
pub mod shortener;

pub use shortener::UrlShortener;
pub use urlshortener_core::{Expansion, Shortener, ShortenerError};
