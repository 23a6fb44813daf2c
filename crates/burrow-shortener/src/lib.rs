//! URL shortener service implementation.
//!
//! This crate wires the deterministic generator to a mapping store and
//! coordinates batch ingestion. Core types are re-exported from `burrow_core`.

pub mod batch;
pub mod service;
pub mod validate;

pub use burrow_core::{Shortener, ShortenerError};
pub use service::ShortenerService;
