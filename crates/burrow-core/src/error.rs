use thiserror::Error;

/// Result type for mapping store operations.
pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("short code not found: {0}")]
    NotFound(String),
    #[error("short code {code} already maps to '{existing_url}', refusing '{rejected_url}'")]
    Collision {
        code: String,
        existing_url: String,
        rejected_url: String,
    },
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
    #[error("storage i/o failed: {0}")]
    Io(String),
    #[error("storage operation failed: {0}")]
    Operation(String),
}

impl StorageError {
    /// `NotFound` is an expected lookup outcome rather than a fault.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }
}

impl From<std::io::Error> for StorageError {
    fn from(value: std::io::Error) -> Self {
        StorageError::Io(value.to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum CoreError {
    #[error("invalid short code: {0}")]
    InvalidShortCode(String),
}

#[derive(Debug, Clone, Error)]
pub enum ShortenerError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("short code not found: {0}")]
    NotFound(String),
    #[error("storage error: {0}")]
    Storage(StorageError),
}

impl From<StorageError> for ShortenerError {
    fn from(value: StorageError) -> Self {
        match value {
            StorageError::NotFound(code) => Self::NotFound(code),
            other => Self::Storage(other),
        }
    }
}

impl From<CoreError> for ShortenerError {
    fn from(value: CoreError) -> Self {
        match value {
            CoreError::InvalidShortCode(message) => Self::NotFound(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_not_found_becomes_shortener_not_found() {
        let err = ShortenerError::from(StorageError::NotFound("abc123".to_string()));
        assert!(matches!(err, ShortenerError::NotFound(code) if code == "abc123"));

        let err = ShortenerError::from(StorageError::Timeout("slow".to_string()));
        assert!(matches!(err, ShortenerError::Storage(StorageError::Timeout(_))));
    }

    #[test]
    fn malformed_code_is_not_found() {
        let err = ShortenerError::from(CoreError::InvalidShortCode("ab".to_string()));
        assert!(matches!(err, ShortenerError::NotFound(_)));
    }
}
