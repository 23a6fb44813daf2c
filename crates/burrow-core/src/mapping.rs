use crate::shortcode::ShortCode;
use serde::{Deserialize, Serialize};

/// A persisted association between a short code and a long URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mapping {
    pub short_code: ShortCode,
    pub original_url: String,
}

/// A candidate mapping submitted to a store.
///
/// `short_code` is what the generator computed for `original_url`; the store
/// may resolve the URL to a different, previously stored code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UrlPair {
    pub short_code: ShortCode,
    pub original_url: String,
}

impl UrlPair {
    pub fn new(short_code: ShortCode, original_url: impl Into<String>) -> Self {
        Self {
            short_code,
            original_url: original_url.into(),
        }
    }
}

impl From<UrlPair> for Mapping {
    fn from(pair: UrlPair) -> Self {
        Mapping {
            short_code: pair.short_code,
            original_url: pair.original_url,
        }
    }
}

/// Outcome of saving a single URL.
///
/// Saving a URL that is already stored is not an error: the store hands back
/// the code it already holds for that URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The URL was new and the mapping was created with this code.
    Created(ShortCode),
    /// The URL was already stored under this code.
    AlreadyExists(ShortCode),
}

impl SaveOutcome {
    pub fn code(&self) -> &ShortCode {
        match self {
            SaveOutcome::Created(code) | SaveOutcome::AlreadyExists(code) => code,
        }
    }

    pub fn into_code(self) -> ShortCode {
        match self {
            SaveOutcome::Created(code) | SaveOutcome::AlreadyExists(code) => code,
        }
    }

    pub fn already_existed(&self) -> bool {
        matches!(self, SaveOutcome::AlreadyExists(_))
    }
}
