use crate::batch;
use crate::validate::validate_url;
use async_trait::async_trait;
use burrow_core::{
    BatchItem, BatchResult, Generator, MappingStore, SaveOutcome, ShortCode, Shortener,
    ShortenerError, UrlPair,
};
use std::sync::Arc;
use tracing::{debug, info};

/// A concrete implementation of the `Shortener` trait.
///
/// This service wraps a `MappingStore` and a `Generator`:
/// - the generator derives the candidate code from the URL
/// - the store decides whether the URL is new and which code it resolves to
///
/// Because codes are deterministic, a repeated submission needs no lookup
/// before the write; the store reports the existing mapping instead.
#[derive(Debug)]
pub struct ShortenerService<S: ?Sized, G> {
    store: Arc<S>,
    generator: Arc<G>,
}

impl<S: ?Sized, G> Clone for ShortenerService<S, G> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            generator: Arc::clone(&self.generator),
        }
    }
}

impl<S: MappingStore + ?Sized, G: Generator> ShortenerService<S, G> {
    pub fn new(store: Arc<S>, generator: G) -> Self {
        Self {
            store,
            generator: Arc::new(generator),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }
}

#[async_trait]
impl<S: MappingStore + ?Sized, G: Generator> Shortener for ShortenerService<S, G> {
    async fn shorten(&self, original_url: &str) -> Result<SaveOutcome, ShortenerError> {
        validate_url(original_url)?;

        let pair = UrlPair::new(self.generator.generate(original_url), original_url);
        let outcome = self.store.save(&pair).await?;

        if outcome.already_existed() {
            debug!(code = %outcome.code(), url = original_url, "url already shortened");
        } else {
            info!(code = %outcome.code(), url = original_url, "shortened url");
        }
        Ok(outcome)
    }

    async fn shorten_batch(
        &self,
        items: Vec<BatchItem>,
    ) -> Result<Vec<BatchResult>, ShortenerError> {
        let pairs = batch::prepare(&items, self.generator.as_ref())?;
        let resolved = self.store.save_batch(&pairs).await?;
        batch::correlate(items, &resolved)
    }

    async fn resolve(&self, code: &ShortCode) -> Result<String, ShortenerError> {
        Ok(self.store.resolve(code).await?)
    }

    async fn health_check(&self) -> Result<(), ShortenerError> {
        Ok(self.store.health_check().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burrow_core::HashGenerator;
    use burrow_storage::InMemoryStore;

    fn test_service() -> ShortenerService<InMemoryStore, HashGenerator> {
        ShortenerService::new(Arc::new(InMemoryStore::new()), HashGenerator::default())
    }

    fn item(id: &str, url: &str) -> BatchItem {
        BatchItem {
            correlation_id: id.to_string(),
            original_url: url.to_string(),
        }
    }

    #[tokio::test]
    async fn shorten_is_idempotent() {
        let service = test_service();

        let first = service.shorten("https://example.com").await.unwrap();
        let second = service.shorten("https://example.com").await.unwrap();

        assert!(!first.already_existed());
        assert!(second.already_existed());
        assert_eq!(first.code(), second.code());
    }

    #[tokio::test]
    async fn shorten_then_resolve() {
        let service = test_service();

        let outcome = service.shorten("https://example.com/a?b=c").await.unwrap();
        let url = service.resolve(outcome.code()).await.unwrap();

        assert_eq!(url, "https://example.com/a?b=c");
    }

    #[tokio::test]
    async fn shorten_empty_url_fails() {
        let service = test_service();

        let err = service.shorten("").await.unwrap_err();
        assert!(matches!(err, ShortenerError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn shorten_rejects_control_characters() {
        let service = test_service();

        let err = service.shorten("http://a.com/x\ny").await.unwrap_err();
        assert!(matches!(err, ShortenerError::InvalidUrl(_)));
        assert!(service.store().is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn resolve_unknown_code() {
        let service = test_service();

        let err = service
            .resolve(&ShortCode::new("nonexistent").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, ShortenerError::NotFound(_)));
    }

    #[tokio::test]
    async fn batch_correlates_every_item() {
        let service = test_service();

        let results = service
            .shorten_batch(vec![
                item("1", "https://a.com"),
                item("2", "https://b.com"),
                item("3", "https://a.com"),
            ])
            .await
            .unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].short_code, results[2].short_code);
        assert_ne!(results[0].short_code, results[1].short_code);
        assert_eq!(service.store().len().await.unwrap(), 2);

        let outcome = service.shorten("https://a.com").await.unwrap();
        assert!(outcome.already_existed());
        assert_eq!(outcome.code(), &results[0].short_code);
    }

    #[tokio::test]
    async fn batch_reuses_codes_saved_earlier() {
        let service = test_service();
        let earlier = service.shorten("https://a.com").await.unwrap();

        let results = service
            .shorten_batch(vec![item("only", "https://a.com")])
            .await
            .unwrap();

        assert_eq!(&results[0].short_code, earlier.code());
    }

    #[tokio::test]
    async fn works_behind_trait_object() {
        let store: Arc<dyn MappingStore> = Arc::new(InMemoryStore::new());
        let service: Arc<dyn Shortener> =
            Arc::new(ShortenerService::new(store, HashGenerator::default()));

        service.health_check().await.unwrap();
        let outcome = service.shorten("https://example.com").await.unwrap();
        assert_eq!(
            service.resolve(outcome.code()).await.unwrap(),
            "https://example.com"
        );
    }
}
