use crate::error::Result;
use crate::mapping::{SaveOutcome, UrlPair};
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use std::collections::HashMap;

/// The deduplicating mapping store.
///
/// Every backend honours the same contract: at most one mapping exists per
/// distinct original URL, and once a code resolves to a URL it keeps resolving
/// to it for the lifetime of the store.
#[async_trait]
pub trait MappingStore: Send + Sync + 'static {
    /// Inserts the pair unless its URL is already stored.
    ///
    /// Returns [`SaveOutcome::AlreadyExists`] carrying the *stored* code when
    /// the URL was saved before. Fails with `Collision` when the code is
    /// already held by a different URL.
    async fn save(&self, pair: &UrlPair) -> Result<SaveOutcome>;

    /// Looks up the original URL for a code.
    /// Returns `Err(NotFound)` if the code does not exist.
    async fn resolve(&self, code: &ShortCode) -> Result<String>;

    /// Persists every previously absent pair as one atomic unit.
    ///
    /// The returned map holds one entry per distinct submitted URL, pointing
    /// at its resolved code (new or pre-existing). On error nothing from the
    /// batch is visible.
    async fn save_batch(&self, pairs: &[UrlPair]) -> Result<HashMap<String, ShortCode>>;

    /// Verifies the backend is operational without mutating it.
    async fn health_check(&self) -> Result<()>;

    /// Number of stored mappings.
    async fn len(&self) -> Result<usize>;

    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Releases resources owned by the store. Calls after the first are no-ops.
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
