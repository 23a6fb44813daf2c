use crate::mapping::SaveOutcome;
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

type Result<T> = std::result::Result<T, crate::error::ShortenerError>;

/// One caller-supplied item of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItem {
    /// Opaque caller token echoed back in the matching [`BatchResult`].
    pub correlation_id: String,
    /// The original URL to be shortened.
    pub original_url: String,
}

/// The resolved code for one [`BatchItem`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    pub correlation_id: String,
    pub short_code: ShortCode,
}

#[async_trait]
pub trait Shortener: Send + Sync + 'static {
    /// Shortens a URL, reporting whether it had been shortened before.
    async fn shorten(&self, original_url: &str) -> Result<SaveOutcome>;

    /// Shortens every item atomically. Results come back in input order.
    async fn shorten_batch(&self, items: Vec<BatchItem>) -> Result<Vec<BatchResult>>;

    /// Resolves a short code to its original URL.
    async fn resolve(&self, code: &ShortCode) -> Result<String>;

    /// Checks that the underlying store is reachable.
    async fn health_check(&self) -> Result<()>;
}
