use burrow_core::generator::DEFAULT_CODE_LENGTH;
use burrow_storage::{FileStoreOptions, PostgresOptions, StorageConfig};
use clap::{Parser, ValueEnum};
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const LISTEN_ADDR_ENV: &str = "SERVER_ADDRESS";
pub const BASE_URL_ENV: &str = "BASE_URL";
pub const FILE_STORAGE_PATH_ENV: &str = "FILE_STORAGE_PATH";
pub const DATABASE_DSN_ENV: &str = "DATABASE_DSN";
pub const STORAGE_BACKEND_ENV: &str = "BURROW_STORAGE_BACKEND";
pub const ID_LENGTH_ENV: &str = "BURROW_ID_LENGTH";
pub const DB_MAX_CONNECTIONS_ENV: &str = "BURROW_DB_MAX_CONNECTIONS";
pub const DB_TIMEOUT_MS_ENV: &str = "BURROW_DB_TIMEOUT_MS";
pub const LOG_FORMAT_ENV: &str = "BURROW_LOG_FORMAT";

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8888";
pub const DEFAULT_BASE_URL: &str = "http://localhost:8888";

/// Loads `.env` from the working directory or one of its parents.
///
/// Variables already present in the environment are left untouched.
pub fn load_dotenv() -> Option<PathBuf> {
    dotenvy::dotenv().ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "file")]
    File,
    #[value(name = "postgres")]
    Postgres,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::File => write!(f, "file"),
            StorageBackendArg::Postgres => write!(f, "postgres"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "burrow", about = "Deduplicating URL shortener")]
pub struct CLI {
    #[arg(short = 'a', long, env = LISTEN_ADDR_ENV, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    /// Public prefix of the returned short URLs.
    #[arg(short = 'b', long, env = BASE_URL_ENV, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    #[arg(short = 'f', long, env = FILE_STORAGE_PATH_ENV)]
    pub file_storage_path: Option<PathBuf>,

    #[arg(short = 'd', long, env = DATABASE_DSN_ENV)]
    pub database_dsn: Option<String>,

    /// Defaults to postgres when a DSN is set, else file when a path is set.
    #[arg(long, env = STORAGE_BACKEND_ENV, value_enum)]
    pub storage: Option<StorageBackendArg>,

    #[arg(long, env = ID_LENGTH_ENV, default_value_t = DEFAULT_CODE_LENGTH)]
    pub id_length: usize,

    #[arg(long, env = DB_MAX_CONNECTIONS_ENV, default_value_t = 10)]
    pub db_max_connections: u32,

    #[arg(long, env = DB_TIMEOUT_MS_ENV, default_value_t = 5000)]
    pub db_timeout_ms: u64,

    #[arg(long, env = LOG_FORMAT_ENV, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

impl CLI {
    pub fn storage_backend(&self) -> StorageBackendArg {
        match self.storage {
            Some(backend) => backend,
            None if self.database_dsn.is_some() => StorageBackendArg::Postgres,
            None if self.file_storage_path.is_some() => StorageBackendArg::File,
            None => StorageBackendArg::InMemory,
        }
    }

    pub fn storage_config(&self) -> anyhow::Result<StorageConfig> {
        let config = match self.storage_backend() {
            StorageBackendArg::InMemory => StorageConfig::Memory,
            StorageBackendArg::File => {
                let path = self.file_storage_path.clone().ok_or_else(|| {
                    anyhow::anyhow!("file storage path is required when storage backend is file")
                })?;
                StorageConfig::File(
                    FileStoreOptions::builder()
                        .path(path)
                        .base_url(self.base_url.as_str())
                        .build(),
                )
            }
            StorageBackendArg::Postgres => {
                let dsn = self.database_dsn.clone().ok_or_else(|| {
                    anyhow::anyhow!("database dsn is required when storage backend is postgres")
                })?;
                StorageConfig::Postgres(
                    PostgresOptions::builder()
                        .dsn(dsn)
                        .max_connections(self.db_max_connections)
                        .op_timeout(Duration::from_millis(self.db_timeout_ms))
                        .build(),
                )
            }
        };

        Ok(config)
    }
}
