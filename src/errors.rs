/*!
 * Error types for the translation pipeline.
 *
 * This module contains custom error types for the different layers of the
 * pipeline, using the thiserror crate for ergonomic error definitions.
 * `ProviderError` describes a single provider attempt, `TranslationError`
 * is what pipeline callers see, and `AppError` wraps everything for the binary.
 */

use thiserror::Error;

/// Errors that can occur during a single call to a translation provider
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// The provider does not support the requested language pair
    #[error("Unsupported language pair: {0}")]
    UnsupportedLanguagePair(String),

    /// The call did not complete within the configured timeout
    #[error("Request timed out after {0}s")]
    Timeout(u64),
}

impl ProviderError {
    /// Whether another attempt may succeed.
    ///
    /// HTTP 429/500/502/503/504 and connection failures are transient.
    /// Timeouts are not: the segment is given up on after one hung call.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ConnectionError(_) | Self::RateLimitExceeded(_) => true,
            Self::ApiError { status_code, .. } => {
                matches!(status_code, 429 | 500 | 502 | 503 | 504)
            }
            _ => false,
        }
    }
}

/// Errors surfaced by the translation pipeline
#[derive(Error, Debug, Clone)]
pub enum TranslationError {
    /// Tokenized segments no longer reproduce the input; the markup is not safe to emit
    #[error("Tokenization invariant violated: segments cover {actual_len} bytes of {expected_len}")]
    TokenizationInvariantViolation {
        /// Length of the original input in bytes
        expected_len: usize,
        /// Length of the concatenated segments in bytes
        actual_len: usize,
    },

    /// The provider kept failing with transient errors
    #[error("Translation provider unavailable after {attempts} attempt(s): {last_error}")]
    ProviderUnavailable {
        /// Number of attempts made
        attempts: u32,
        /// The error from the final attempt
        last_error: String,
    },

    /// The provider rejected the request and retrying will not help
    #[error("Translation provider rejected the request: {reason}")]
    ProviderRejected {
        /// Provider error message
        reason: String,
        /// Whether the rejection was for an unsupported language pair
        unsupported_pair: bool,
    },

    /// A cache backend failed; callers treat this as a miss
    #[error("Cache unavailable: {0}")]
    CacheUnavailable(String),

    /// The translated document could not be written
    #[error("Persistence conflict: {0}")]
    PersistenceConflict(String),

    /// The requested source document does not exist
    #[error("Document not found: {0}")]
    DocumentNotFound(String),
}

impl TranslationError {
    /// Whether this error came from the provider rejecting an unsupported language pair
    pub fn is_unsupported_pair(&self) -> bool {
        matches!(self, Self::ProviderRejected { unsupported_pair: true, .. })
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Error from configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
