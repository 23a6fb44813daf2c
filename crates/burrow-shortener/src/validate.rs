use burrow_core::ShortenerError;

/// Checks a URL before it reaches a store.
///
/// Rejects empty input and control characters, which cannot appear in a
/// `Location` header or in a PostgreSQL text value.
pub fn validate_url(url: &str) -> Result<(), ShortenerError> {
    if url.is_empty() {
        return Err(ShortenerError::InvalidUrl(
            "URL cannot be empty".to_string(),
        ));
    }

    if let Some(c) = url.chars().find(|c| c.is_control()) {
        return Err(ShortenerError::InvalidUrl(format!(
            "URL contains control character {:?}",
            c
        )));
    }

    Ok(())
}
