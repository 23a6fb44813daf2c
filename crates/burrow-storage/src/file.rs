use crate::table::MappingTable;
use async_trait::async_trait;
use burrow_core::error::{Result, StorageError};
use burrow_core::{MappingStore, SaveOutcome, ShortCode, UrlPair};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use typed_builder::TypedBuilder;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8888";

/// Settings for a [`FileStore`].
#[derive(Debug, Clone, TypedBuilder)]
pub struct FileStoreOptions {
    /// Snapshot file, created on the first write if it does not exist.
    #[builder(setter(into))]
    pub path: PathBuf,
    /// Public base URL written into each record's `short_url` field.
    #[builder(default = DEFAULT_BASE_URL.to_string(), setter(into))]
    pub base_url: String,
}

/// One line of the snapshot file.
#[derive(Debug, Serialize, Deserialize)]
struct FileRecord {
    uuid: String,
    short_url: String,
    original_url: String,
}

/// A mapping store journaled to a newline-delimited JSON file.
///
/// The snapshot is read once in [`FileStore::open`]. Afterwards the in-memory
/// table is authoritative and every mutation that creates a mapping rewrites
/// the whole file while still holding the write lock, so writers are fully
/// serialized through both the table and the file.
#[derive(Debug)]
pub struct FileStore {
    table: RwLock<MappingTable>,
    options: FileStoreOptions,
    closed: AtomicBool,
}

impl FileStore {
    /// Opens the store, replaying the snapshot at `options.path`.
    ///
    /// A missing or unreadable file yields an empty store, and malformed
    /// lines are skipped; both are logged rather than failing startup.
    pub async fn open(options: FileStoreOptions) -> Result<Self> {
        let table = load_snapshot(&options.path).await;
        info!(
            path = %options.path.display(),
            mappings = table.len(),
            "loaded file store"
        );

        Ok(Self {
            table: RwLock::new(table),
            options,
            closed: AtomicBool::new(false),
        })
    }

    pub fn path(&self) -> &Path {
        &self.options.path
    }

    async fn persist(&self, table: &MappingTable) -> Result<()> {
        let mut buf = String::new();
        for mapping in table.entries() {
            let record = FileRecord {
                uuid: mapping.short_code.to_string(),
                short_url: mapping.short_code.to_url(&self.options.base_url),
                original_url: mapping.original_url.clone(),
            };
            let line = serde_json::to_string(&record)
                .map_err(|e| StorageError::InvalidData(e.to_string()))?;
            buf.push_str(&line);
            buf.push('\n');
        }

        let path = &self.options.path;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Write aside and rename so a crash mid-write never truncates the snapshot.
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, buf).await?;
        tokio::fs::rename(&tmp, path).await?;

        debug!(path = %path.display(), mappings = table.len(), "rewrote snapshot");
        Ok(())
    }
}

async fn load_snapshot(path: &Path) -> MappingTable {
    let mut table = MappingTable::new();

    let contents = match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => return table,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "cannot read snapshot, starting empty");
            return table;
        }
    };

    for (lineno, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        let record: FileRecord = match serde_json::from_str(line) {
            Ok(record) => record,
            Err(err) => {
                warn!(line = lineno + 1, error = %err, "skipping malformed snapshot record");
                continue;
            }
        };

        let pair = UrlPair::new(ShortCode::new_unchecked(record.uuid), record.original_url);
        if let Err(err) = table.insert(&pair) {
            warn!(line = lineno + 1, error = %err, "skipping conflicting snapshot record");
        }
    }

    table
}

#[async_trait]
impl MappingStore for FileStore {
    async fn save(&self, pair: &UrlPair) -> Result<SaveOutcome> {
        let mut table = self.table.write().await;
        let checkpoint = table.len();
        let outcome = table.insert(pair)?;

        if !outcome.already_existed() {
            if let Err(err) = self.persist(&table).await {
                table.rollback_to(checkpoint);
                return Err(err);
            }
        }

        debug!(code = %outcome.code(), existed = outcome.already_existed(), "saved mapping");
        Ok(outcome)
    }

    async fn resolve(&self, code: &ShortCode) -> Result<String> {
        self.table
            .read()
            .await
            .resolve(code)
            .map(str::to_owned)
            .ok_or_else(|| StorageError::NotFound(code.to_string()))
    }

    async fn save_batch(&self, pairs: &[UrlPair]) -> Result<HashMap<String, ShortCode>> {
        if pairs.is_empty() {
            return Ok(HashMap::new());
        }

        let mut table = self.table.write().await;
        let applied = table.insert_batch(pairs)?;
        let created = applied.created(&table);

        if created > 0 {
            if let Err(err) = self.persist(&table).await {
                table.rollback_to(applied.checkpoint);
                return Err(err);
            }
        }

        info!(submitted = pairs.len(), created, "committed batch");
        Ok(applied.resolved)
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.table.read().await.len())
    }

    async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let table = self.table.read().await;
        self.persist(&table).await?;
        info!(path = %self.options.path.display(), mappings = table.len(), "closed file store");
        Ok(())
    }
}
