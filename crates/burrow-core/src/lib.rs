//! Core types and traits for the Burrow URL shortener.
//!
//! This crate provides the shared domain types, the [`MappingStore`]
//! contract implemented by every storage backend, and the deterministic
//! short code [`Generator`].

pub mod error;
pub mod generator;
pub mod mapping;
pub mod shortcode;
pub mod shortener;
pub mod store;

pub use error::{CoreError, ShortenerError, StorageError};
pub use generator::{Generator, HashGenerator};
pub use mapping::{Mapping, SaveOutcome, UrlPair};
pub use shortcode::ShortCode;
pub use shortener::{BatchItem, BatchResult, Shortener};
pub use store::MappingStore;
