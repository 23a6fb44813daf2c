use burrow_core::error::{Result, StorageError};
use burrow_core::{Mapping, SaveOutcome, ShortCode, UrlPair};
use std::collections::HashMap;

/// In-process index shared by the memory and file backends.
///
/// Mappings are append-only and kept in insertion order, which gives the file
/// backend a stable snapshot order and makes rollback a truncation.
#[derive(Debug, Default, Clone)]
pub(crate) struct MappingTable {
    entries: Vec<Mapping>,
    by_code: HashMap<ShortCode, usize>,
    by_url: HashMap<String, usize>,
}

/// A batch applied to the table, reversible until the caller commits to it.
#[derive(Debug)]
pub(crate) struct AppliedBatch {
    pub resolved: HashMap<String, ShortCode>,
    /// Table length before the batch; pass to [`MappingTable::rollback_to`].
    pub checkpoint: usize,
}

impl AppliedBatch {
    pub fn created(&self, table: &MappingTable) -> usize {
        table.len() - self.checkpoint
    }
}

impl MappingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[Mapping] {
        &self.entries
    }

    pub fn resolve(&self, code: &ShortCode) -> Option<&str> {
        self.by_code
            .get(code)
            .map(|&idx| self.entries[idx].original_url.as_str())
    }

    pub fn code_for(&self, original_url: &str) -> Option<&ShortCode> {
        self.by_url
            .get(original_url)
            .map(|&idx| &self.entries[idx].short_code)
    }

    /// Inserts the pair unless its URL is already present.
    pub fn insert(&mut self, pair: &UrlPair) -> Result<SaveOutcome> {
        if let Some(existing) = self.code_for(&pair.original_url) {
            return Ok(SaveOutcome::AlreadyExists(existing.clone()));
        }

        if let Some(existing_url) = self.resolve(&pair.short_code) {
            return Err(StorageError::Collision {
                code: pair.short_code.to_string(),
                existing_url: existing_url.to_owned(),
                rejected_url: pair.original_url.clone(),
            });
        }

        let idx = self.entries.len();
        self.by_code.insert(pair.short_code.clone(), idx);
        self.by_url.insert(pair.original_url.clone(), idx);
        self.entries.push(Mapping {
            short_code: pair.short_code.clone(),
            original_url: pair.original_url.clone(),
        });

        Ok(SaveOutcome::Created(pair.short_code.clone()))
    }

    /// Inserts every absent pair, or none of them.
    ///
    /// On error the table is left exactly as it was before the call.
    pub fn insert_batch(&mut self, pairs: &[UrlPair]) -> Result<AppliedBatch> {
        let checkpoint = self.len();
        let mut resolved = HashMap::with_capacity(pairs.len());

        for pair in pairs {
            match self.insert(pair) {
                Ok(outcome) => {
                    resolved.insert(pair.original_url.clone(), outcome.into_code());
                }
                Err(err) => {
                    self.rollback_to(checkpoint);
                    return Err(err);
                }
            }
        }

        Ok(AppliedBatch {
            resolved,
            checkpoint,
        })
    }

    /// Drops every mapping appended after `checkpoint`.
    pub fn rollback_to(&mut self, checkpoint: usize) {
        while self.entries.len() > checkpoint {
            if let Some(mapping) = self.entries.pop() {
                self.by_code.remove(&mapping.short_code);
                self.by_url.remove(&mapping.original_url);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(code: &str, url: &str) -> UrlPair {
        UrlPair::new(ShortCode::new_unchecked(code), url)
    }

    #[test]
    fn insert_then_resolve() {
        let mut table = MappingTable::new();

        let outcome = table.insert(&pair("abc123", "http://a.com")).unwrap();

        assert_eq!(outcome, SaveOutcome::Created(ShortCode::new_unchecked("abc123")));
        assert_eq!(
            table.resolve(&ShortCode::new_unchecked("abc123")),
            Some("http://a.com")
        );
    }

    #[test]
    fn existing_url_returns_stored_code() {
        let mut table = MappingTable::new();
        table.insert(&pair("abc123", "http://a.com")).unwrap();

        let outcome = table.insert(&pair("other1", "http://a.com")).unwrap();

        assert_eq!(
            outcome,
            SaveOutcome::AlreadyExists(ShortCode::new_unchecked("abc123"))
        );
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn code_held_by_other_url_is_a_collision() {
        let mut table = MappingTable::new();
        table.insert(&pair("abc123", "http://a.com")).unwrap();

        let err = table.insert(&pair("abc123", "http://b.com")).unwrap_err();

        assert!(matches!(err, StorageError::Collision { .. }));
        assert_eq!(
            table.resolve(&ShortCode::new_unchecked("abc123")),
            Some("http://a.com")
        );
    }

    #[test]
    fn failed_batch_leaves_table_untouched() {
        let mut table = MappingTable::new();
        table.insert(&pair("abc123", "http://a.com")).unwrap();

        let err = table
            .insert_batch(&[
                pair("new001", "http://new.com"),
                pair("abc123", "http://b.com"),
            ])
            .unwrap_err();

        assert!(matches!(err, StorageError::Collision { .. }));
        assert_eq!(table.len(), 1);
        assert!(table.code_for("http://new.com").is_none());
        assert!(table.resolve(&ShortCode::new_unchecked("new001")).is_none());
    }

    #[test]
    fn batch_dedupes_by_url() {
        let mut table = MappingTable::new();

        let applied = table
            .insert_batch(&[
                pair("aaa111", "http://a.com"),
                pair("bbb222", "http://b.com"),
                pair("aaa111", "http://a.com"),
            ])
            .unwrap();

        assert_eq!(applied.resolved.len(), 2);
        assert_eq!(applied.created(&table), 2);
    }

    #[test]
    fn rollback_restores_indexes() {
        let mut table = MappingTable::new();
        table.insert(&pair("aaa111", "http://a.com")).unwrap();
        table.insert(&pair("bbb222", "http://b.com")).unwrap();

        table.rollback_to(1);

        assert_eq!(table.len(), 1);
        assert!(table.code_for("http://b.com").is_none());
        table.insert(&pair("bbb222", "http://b.com")).unwrap();
    }
}
