use async_trait::async_trait;
use burrow_core::error::{Result, StorageError};
use burrow_core::{MappingStore, SaveOutcome, ShortCode, UrlPair};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Connection, PgPool, Postgres, Transaction};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};
use typed_builder::TypedBuilder;

const SCHEMA: &str = include_str!("../ddl/postgres/urls.sql");

/// Connection settings for a [`PostgresStore`].
#[derive(Debug, Clone, TypedBuilder)]
pub struct PostgresOptions {
    #[builder(setter(into))]
    pub dsn: String,
    #[builder(default = 10)]
    pub max_connections: u32,
    /// Upper bound for every store operation, pool acquisition included.
    #[builder(default = Duration::from_secs(5))]
    pub op_timeout: Duration,
}

/// PostgreSQL implementation of the [`MappingStore`] contract.
///
/// Deduplication is delegated to the `UNIQUE (original_url)` constraint: when
/// two callers race to insert the same URL, the loser's insert returns no row
/// and it reads back the winner's code. `UNIQUE (short_id)` turns an
/// identifier collision into a skipped insert, reported as `Collision`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
    op_timeout: Duration,
}

impl PostgresStore {
    /// Creates a store from an existing connection pool.
    pub fn new(pool: PgPool, op_timeout: Duration) -> Self {
        Self { pool, op_timeout }
    }

    /// Opens a new connection pool.
    pub async fn connect(options: &PostgresOptions) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(options.max_connections)
            .acquire_timeout(options.op_timeout)
            .connect(&options.dsn)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool, options.op_timeout))
    }

    /// Creates the `urls` table if it does not exist yet.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs `fut`, failing with `Timeout` once the operation deadline passes.
    ///
    /// Dropping the timed-out future releases its connection, and a dropped
    /// transaction rolls back.
    async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::time::timeout(self.op_timeout, fut)
            .await
            .map_err(|_| {
                StorageError::Timeout(format!(
                    "{operation} exceeded {}ms",
                    self.op_timeout.as_millis()
                ))
            })?
    }

    async fn insert_one(&self, pair: &UrlPair) -> Result<SaveOutcome> {
        let inserted: Option<String> = sqlx::query_scalar(
            r#"
            INSERT INTO urls (short_id, original_url)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            RETURNING short_id
            "#,
        )
        .bind(pair.short_code.as_str())
        .bind(&pair.original_url)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if let Some(code) = inserted {
            return Ok(SaveOutcome::Created(ShortCode::new_unchecked(code)));
        }

        // Nothing inserted: either the URL is stored already, or the code
        // belongs to another URL.
        let existing: Option<String> =
            sqlx::query_scalar("SELECT short_id FROM urls WHERE original_url = $1")
                .bind(&pair.original_url)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        match existing {
            Some(code) => Ok(SaveOutcome::AlreadyExists(ShortCode::new_unchecked(code))),
            None => {
                let holder: Option<String> =
                    sqlx::query_scalar("SELECT original_url FROM urls WHERE short_id = $1")
                        .bind(pair.short_code.as_str())
                        .fetch_optional(&self.pool)
                        .await
                        .map_err(map_sqlx_error)?;
                Err(collision(pair, holder))
            }
        }
    }

    async fn insert_batch(&self, pairs: &[UrlPair]) -> Result<HashMap<String, ShortCode>> {
        let mut seen = HashSet::with_capacity(pairs.len());
        let mut unique: Vec<&UrlPair> = pairs
            .iter()
            .filter(|pair| seen.insert(pair.original_url.as_str()))
            .collect();
        // Concurrent batches must take the unique-index locks in one global
        // order, otherwise overlapping batches can deadlock.
        unique.sort_unstable_by(|a, b| a.original_url.cmp(&b.original_url));

        let (codes, urls): (Vec<String>, Vec<String>) = unique
            .into_iter()
            .map(|pair| (pair.short_code.to_string(), pair.original_url.clone()))
            .unzip();

        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO urls (short_id, original_url)
            SELECT * FROM UNNEST($1::text[], $2::text[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(&codes)
        .bind(&urls)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?
        .rows_affected();

        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT original_url, short_id FROM urls WHERE original_url = ANY($1)",
        )
        .bind(&urls)
        .fetch_all(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        let resolved: HashMap<String, ShortCode> = rows
            .into_iter()
            .map(|(url, code)| (url, ShortCode::new_unchecked(code)))
            .collect();

        if let Some(missing) = pairs
            .iter()
            .find(|pair| !resolved.contains_key(&pair.original_url))
        {
            let err = collision_in_tx(&mut tx, missing).await;
            tx.rollback().await.map_err(map_sqlx_error)?;
            return Err(err);
        }

        tx.commit().await.map_err(map_sqlx_error)?;

        info!(
            submitted = pairs.len(),
            created = inserted,
            "committed batch"
        );
        Ok(resolved)
    }
}

async fn collision_in_tx(tx: &mut Transaction<'_, Postgres>, pair: &UrlPair) -> StorageError {
    let holder = sqlx::query_scalar("SELECT original_url FROM urls WHERE short_id = $1")
        .bind(pair.short_code.as_str())
        .fetch_optional(&mut **tx)
        .await;

    match holder {
        Ok(holder) => collision(pair, holder),
        Err(err) => map_sqlx_error(err),
    }
}

fn collision(pair: &UrlPair, holder: Option<String>) -> StorageError {
    match holder {
        Some(existing_url) => {
            warn!(code = %pair.short_code, url = %pair.original_url, "short code collision");
            StorageError::Collision {
                code: pair.short_code.to_string(),
                existing_url,
                rejected_url: pair.original_url.clone(),
            }
        }
        None => StorageError::Operation(format!(
            "insert of '{}' was skipped but no conflicting row exists",
            pair.original_url
        )),
    }
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

#[async_trait]
impl MappingStore for PostgresStore {
    async fn save(&self, pair: &UrlPair) -> Result<SaveOutcome> {
        let outcome = self.bounded("save", self.insert_one(pair)).await?;
        debug!(code = %outcome.code(), existed = outcome.already_existed(), "saved mapping");
        Ok(outcome)
    }

    async fn resolve(&self, code: &ShortCode) -> Result<String> {
        let url: Option<String> = self
            .bounded("resolve", async {
                sqlx::query_scalar("SELECT original_url FROM urls WHERE short_id = $1")
                    .bind(code.as_str())
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(map_sqlx_error)
            })
            .await?;

        url.ok_or_else(|| StorageError::NotFound(code.to_string()))
    }

    async fn save_batch(&self, pairs: &[UrlPair]) -> Result<HashMap<String, ShortCode>> {
        if pairs.is_empty() {
            return Ok(HashMap::new());
        }

        self.bounded("save_batch", self.insert_batch(pairs)).await
    }

    async fn health_check(&self) -> Result<()> {
        self.bounded("health_check", async {
            let mut conn = self.pool.acquire().await.map_err(map_sqlx_error)?;
            conn.ping().await.map_err(map_sqlx_error)
        })
        .await
    }

    async fn len(&self) -> Result<usize> {
        let count: i64 = self
            .bounded("len", async {
                sqlx::query_scalar("SELECT COUNT(*) FROM urls")
                    .fetch_one(&self.pool)
                    .await
                    .map_err(map_sqlx_error)
            })
            .await?;

        usize::try_from(count).map_err(|e| StorageError::InvalidData(e.to_string()))
    }

    async fn close(&self) -> Result<()> {
        if !self.pool.is_closed() {
            self.pool.close().await;
            info!("closed postgres pool");
        }
        Ok(())
    }
}
