use crate::shortcode::ShortCode;
use xxhash_rust::xxh64::xxh64;

/// Trait for deriving short codes from original URLs.
///
/// Implementations must be pure and deterministic: the same URL always maps
/// to the same code. Stores rely on this to treat a repeated save as a
/// conflict with the existing row instead of a second mapping.
pub trait Generator: Send + Sync + 'static {
    fn generate(&self, original_url: &str) -> ShortCode;
}

/// Width of a base58-encoded `u64`.
const ENCODED_WIDTH: usize = 11;

/// Codes are longer than any single-segment static route (`/ping`).
pub const MIN_CODE_LENGTH: usize = 5;
pub const MAX_CODE_LENGTH: usize = ENCODED_WIDTH;
pub const DEFAULT_CODE_LENGTH: usize = 8;

/// Hashes the URL with xxHash64 and keeps the low-order base58 digits.
///
/// Two different URLs may produce the same code. That case is not resolved
/// here; stores reject the second URL with a collision error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashGenerator {
    length: usize,
    seed: u64,
}

impl HashGenerator {
    /// Creates a generator producing codes of `length` characters.
    ///
    /// `length` is clamped to `MIN_CODE_LENGTH..=MAX_CODE_LENGTH`.
    pub fn new(length: usize) -> Self {
        Self {
            length: length.clamp(MIN_CODE_LENGTH, MAX_CODE_LENGTH),
            seed: 0,
        }
    }

    pub fn with_seed(self, seed: u64) -> Self {
        Self { seed, ..self }
    }

    pub fn length(&self) -> usize {
        self.length
    }

    fn encode(&self, hash: u64) -> String {
        let encoded = bs58::encode(hash.to_be_bytes()).into_string();
        // '1' is the base58 zero digit
        let padded = format!("{:1>width$}", encoded, width = ENCODED_WIDTH);
        padded[ENCODED_WIDTH - self.length..].to_string()
    }
}

impl Default for HashGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_CODE_LENGTH)
    }
}

impl Generator for HashGenerator {
    fn generate(&self, original_url: &str) -> ShortCode {
        let hash = xxh64(original_url.as_bytes(), self.seed);
        ShortCode::new_unchecked(self.encode(hash))
    }
}
