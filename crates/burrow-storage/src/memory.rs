use crate::table::MappingTable;
use async_trait::async_trait;
use burrow_core::error::{Result, StorageError};
use burrow_core::{MappingStore, SaveOutcome, ShortCode, UrlPair};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{debug, info};

/// In-memory implementation of the [`MappingStore`] contract.
///
/// Both indexes live behind one `RwLock` so a save updates them together;
/// lookups take the shared side of the lock. Nothing survives the process.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    table: RwLock<MappingTable>,
}

impl InMemoryStore {
    /// Creates a new, empty in-memory store.
    pub fn new() -> Self {
        Self {
            table: RwLock::new(MappingTable::new()),
        }
    }
}

#[async_trait]
impl MappingStore for InMemoryStore {
    async fn save(&self, pair: &UrlPair) -> Result<SaveOutcome> {
        let outcome = self.table.write().insert(pair)?;
        debug!(code = %outcome.code(), existed = outcome.already_existed(), "saved mapping");
        Ok(outcome)
    }

    async fn resolve(&self, code: &ShortCode) -> Result<String> {
        self.table
            .read()
            .resolve(code)
            .map(str::to_owned)
            .ok_or_else(|| StorageError::NotFound(code.to_string()))
    }

    async fn save_batch(&self, pairs: &[UrlPair]) -> Result<HashMap<String, ShortCode>> {
        if pairs.is_empty() {
            return Ok(HashMap::new());
        }

        let mut table = self.table.write();
        let applied = table.insert_batch(pairs)?;
        info!(
            submitted = pairs.len(),
            created = applied.created(&table),
            "committed batch"
        );
        Ok(applied.resolved)
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.table.read().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn code(s: &str) -> ShortCode {
        ShortCode::new_unchecked(s)
    }

    fn pair(c: &str, url: &str) -> UrlPair {
        UrlPair::new(code(c), url)
    }

    #[tokio::test]
    async fn save_then_repeat_reports_existing() {
        let store = InMemoryStore::new();

        let first = store.save(&pair("abc123", "http://a.com")).await.unwrap();
        let second = store.save(&pair("abc123", "http://a.com")).await.unwrap();

        assert_eq!(first, SaveOutcome::Created(code("abc123")));
        assert_eq!(second, SaveOutcome::AlreadyExists(code("abc123")));
        assert_eq!(store.resolve(&code("abc123")).await.unwrap(), "http://a.com");
    }

    #[tokio::test]
    async fn resolve_unknown_code() {
        let store = InMemoryStore::new();

        let err = store.resolve(&code("zzz")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn existing_url_keeps_stored_code() {
        let store = InMemoryStore::new();
        store.save(&pair("abc123", "http://a.com")).await.unwrap();

        let outcome = store.save(&pair("xyz789", "http://a.com")).await.unwrap();

        assert_eq!(outcome, SaveOutcome::AlreadyExists(code("abc123")));
        assert!(store.resolve(&code("xyz789")).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn batch_dedupes_and_marks_urls_as_existing() {
        let store = InMemoryStore::new();

        let resolved = store
            .save_batch(&[
                pair("aaa111", "http://a.com"),
                pair("bbb222", "http://b.com"),
                pair("aaa111", "http://a.com"),
            ])
            .await
            .unwrap();

        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved["http://a.com"], code("aaa111"));

        let outcome = store.save(&pair("aaa111", "http://a.com")).await.unwrap();
        assert!(outcome.already_existed());
    }

    #[tokio::test]
    async fn batch_resolves_pre_existing_urls() {
        let store = InMemoryStore::new();
        store.save(&pair("old111", "http://a.com")).await.unwrap();

        let resolved = store
            .save_batch(&[pair("new111", "http://a.com"), pair("bbb222", "http://b.com")])
            .await
            .unwrap();

        assert_eq!(resolved["http://a.com"], code("old111"));
        assert_eq!(resolved["http://b.com"], code("bbb222"));
        assert_eq!(store.len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn failed_batch_applies_nothing() {
        let store = InMemoryStore::new();
        store.save(&pair("abc123", "http://a.com")).await.unwrap();

        let err = store
            .save_batch(&[pair("new111", "http://new.com"), pair("abc123", "http://b.com")])
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::Collision { .. }));
        assert_eq!(store.len().await.unwrap(), 1);
        assert!(store.resolve(&code("new111")).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn empty_batch() {
        let store = InMemoryStore::new();

        assert!(store.save_batch(&[]).await.unwrap().is_empty());
        assert!(store.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn concurrent_saves_of_one_url_create_once() {
        let store = Arc::new(InMemoryStore::new());
        let mut handles = vec![];

        for _ in 0..16 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.save(&pair("abc123", "http://a.com")).await.unwrap()
            }));
        }

        let mut created = 0;
        for handle in handles {
            let outcome = handle.await.unwrap();
            assert_eq!(outcome.code(), &code("abc123"));
            if !outcome.already_existed() {
                created += 1;
            }
        }

        assert_eq!(created, 1);
        assert_eq!(store.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn concurrent_overlapping_batches_agree() {
        let store = Arc::new(InMemoryStore::new());
        let forward: Vec<UrlPair> = (0..30)
            .map(|i| pair(&format!("code{i:03}"), &format!("http://example.com/{i}")))
            .collect();
        let mut handles = vec![];

        for n in 0..8 {
            let store = Arc::clone(&store);
            let mut pairs = forward.clone();
            if n % 2 == 1 {
                pairs.reverse();
            }
            handles.push(tokio::spawn(async move { store.save_batch(&pairs).await.unwrap() }));
        }

        let mut results = vec![];
        for handle in handles {
            results.push(handle.await.unwrap());
        }

        assert!(results.iter().all(|resolved| resolved == &results[0]));
        assert_eq!(results[0].len(), 30);
        assert_eq!(store.len().await.unwrap(), 30);
    }

    #[tokio::test]
    async fn health_check_is_noop() {
        let store = InMemoryStore::new();
        store.health_check().await.unwrap();
        store.close().await.unwrap();
    }
}
