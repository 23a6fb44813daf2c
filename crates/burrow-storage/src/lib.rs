//! Storage backends for the Burrow mapping store.
//!
//! All three backends implement [`burrow_core::MappingStore`] with the same
//! observable semantics; [`open_store`] picks one at startup.

pub mod config;
pub mod file;
pub mod memory;
pub mod postgres;
mod table;

pub use burrow_core::{MappingStore, StorageError};
pub use config::{open_store, StorageConfig};
pub use file::{FileStore, FileStoreOptions};
pub use memory::InMemoryStore;
pub use postgres::{PostgresOptions, PostgresStore};
