use crate::file::{FileStore, FileStoreOptions};
use crate::memory::InMemoryStore;
use crate::postgres::{PostgresOptions, PostgresStore};
use burrow_core::error::Result;
use burrow_core::MappingStore;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use tracing::info;

/// Which backend to open, with its settings.
#[derive(Debug, Clone)]
pub enum StorageConfig {
    Memory,
    File(FileStoreOptions),
    Postgres(PostgresOptions),
}

impl Display for StorageConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageConfig::Memory => write!(f, "in-memory"),
            StorageConfig::File(options) => write!(f, "file ({})", options.path.display()),
            StorageConfig::Postgres(_) => write!(f, "postgres"),
        }
    }
}

/// Opens the configured backend behind the common store trait.
///
/// The Postgres backend has its schema created before it is returned.
pub async fn open_store(config: StorageConfig) -> Result<Arc<dyn MappingStore>> {
    info!(backend = %config, "opening mapping store");

    let store: Arc<dyn MappingStore> = match config {
        StorageConfig::Memory => Arc::new(InMemoryStore::new()),
        StorageConfig::File(options) => Arc::new(FileStore::open(options).await?),
        StorageConfig::Postgres(options) => {
            let store = PostgresStore::connect(&options).await?;
            store.migrate().await?;
            Arc::new(store)
        }
    };

    Ok(store)
}
