//! Batch coordination: turns caller items into store pairs and maps the
//! store's per-URL resolution back onto every item.

use burrow_core::{BatchItem, BatchResult, Generator, ShortCode, ShortenerError, StorageError, UrlPair};
use std::collections::HashMap;

use crate::validate::validate_url;

type Result<T> = std::result::Result<T, ShortenerError>;

/// Builds one candidate pair per item.
///
/// Duplicate URLs are kept; the store deduplicates them inside its atomic
/// unit. Rejects an empty batch and any item whose URL fails validation.
pub fn prepare<G: Generator + ?Sized>(items: &[BatchItem], generator: &G) -> Result<Vec<UrlPair>> {
    if items.is_empty() {
        return Err(ShortenerError::InvalidUrl("batch cannot be empty".to_string()));
    }

    items
        .iter()
        .map(|item| {
            validate_url(&item.original_url).map_err(|err| match err {
                ShortenerError::InvalidUrl(reason) => ShortenerError::InvalidUrl(format!(
                    "{reason} (correlation_id '{}')",
                    item.correlation_id
                )),
                other => other,
            })?;
            Ok(UrlPair::new(
                generator.generate(&item.original_url),
                item.original_url.clone(),
            ))
        })
        .collect()
}

/// Pairs every item, in input order, with the code its URL resolved to.
pub fn correlate(
    items: Vec<BatchItem>,
    resolved: &HashMap<String, ShortCode>,
) -> Result<Vec<BatchResult>> {
    items
        .into_iter()
        .map(|item| {
            let short_code = resolved.get(&item.original_url).cloned().ok_or_else(|| {
                StorageError::Operation(format!(
                    "store returned no code for '{}'",
                    item.original_url
                ))
            })?;
            Ok(BatchResult {
                correlation_id: item.correlation_id,
                short_code,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use burrow_core::HashGenerator;

    fn item(id: &str, url: &str) -> BatchItem {
        BatchItem {
            correlation_id: id.to_string(),
            original_url: url.to_string(),
        }
    }

    #[test]
    fn prepare_uses_generator() {
        let generator = HashGenerator::default();
        let pairs = prepare(&[item("1", "http://a.com"), item("2", "http://a.com")], &generator).unwrap();

        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0], pairs[1]);
        assert_eq!(pairs[0].short_code, generator.generate("http://a.com"));
    }

    #[test]
    fn prepare_rejects_empty_input() {
        let generator = HashGenerator::default();

        assert!(matches!(
            prepare(&[], &generator),
            Err(ShortenerError::InvalidUrl(_))
        ));
        assert!(matches!(
            prepare(&[item("1", "")], &generator),
            Err(ShortenerError::InvalidUrl(_))
        ));
        assert!(matches!(
            prepare(&[item("1", "http://a.com"), item("2", "http://a.com/\0")], &generator),
            Err(ShortenerError::InvalidUrl(message)) if message.contains("'2'")
        ));
    }

    #[test]
    fn correlate_keeps_order_and_duplicates() {
        let resolved = HashMap::from([
            ("http://a.com".to_string(), ShortCode::new_unchecked("aaa111")),
            ("http://b.com".to_string(), ShortCode::new_unchecked("bbb222")),
        ]);

        let results = correlate(
            vec![item("x", "http://b.com"), item("y", "http://a.com"), item("z", "http://b.com")],
            &resolved,
        )
        .unwrap();

        let ids: Vec<_> = results.iter().map(|r| r.correlation_id.as_str()).collect();
        assert_eq!(ids, ["x", "y", "z"]);
        assert_eq!(results[0].short_code, results[2].short_code);
        assert_eq!(results[1].short_code.as_str(), "aaa111");
    }

    #[test]
    fn correlate_fails_on_missing_url() {
        let err = correlate(vec![item("x", "http://a.com")], &HashMap::new()).unwrap_err();
        assert!(matches!(err, ShortenerError::Storage(StorageError::Operation(_))));
    }
}
