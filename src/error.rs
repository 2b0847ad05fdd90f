//! Error types for the resource cache and payment flow.

use std::fmt;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for cache and payment operations.
///
/// All fallible operations return `Result<T>` where `Result` is defined as
/// `std::result::Result<T, Error>`. Different variants represent different
/// failure modes:
#[derive(Debug, Clone)]
pub enum Error {
    /// Serialization failed when converting a value to cache bytes.
    ///
    /// Common causes:
    /// - Value contains non-serializable types
    /// - Postcard codec error
    SerializationError(String),

    /// Deserialization failed when converting cache bytes to a value.
    ///
    /// This indicates corrupted or malformed data in the store.
    ///
    /// **Recovery:** the entry should be evicted and refetched.
    DeserializationError(String),

    /// Invalid cache entry: corrupted envelope or bad magic.
    ///
    /// Returned when:
    /// - Magic header is not `b"FDKT"`
    /// - Envelope deserialization fails
    ///
    /// **Recovery:** evict the entry and refetch.
    InvalidCacheEntry(String),

    /// Schema version mismatch between code and cached data.
    ///
    /// Raised when struct fields or enum variants of a cached type changed
    /// between deployments. The entry is evicted and refetched on next
    /// access; no action needed.
    VersionMismatch {
        /// Expected schema version (from compiled code)
        expected: u32,
        /// Found schema version (from the cached entry)
        found: u32,
    },

    /// Cache store error.
    ///
    /// The store failed to read or write an entry. With the in-memory store
    /// this does not occur; custom stores may surface I/O failures here.
    StoreError(String),

    /// Producer (backend fetch) error.
    ///
    /// The async producer supplied to a resource handle rejected. The error
    /// is recorded in the handle's state and never retried automatically;
    /// the caller decides whether to offer a retry control.
    FetchError(String),

    /// A fetch was superseded by a newer fetch for the same handle.
    ///
    /// Not a user-visible failure: handles swallow this variant instead of
    /// recording it in `state().error`.
    Cancelled,

    /// QR image generation failed.
    ///
    /// Reported immediately when a payment flow opens; the countdown never
    /// starts.
    QrError(String),

    /// Payment status check failed.
    ///
    /// Terminal for the payment flow: the session moves to `Failed` and the
    /// error callback fires. The user must close and re-initiate payment.
    GatewayError(String),

    /// Follow-up action failed after a confirmed payment.
    ///
    /// Distinct from a payment failure: the payment went through but the
    /// dependent step (e.g. record creation) needs manual attention.
    FollowUpError(String),

    /// Configuration error during construction.
    ConfigError(String),

    /// Generic error with custom message.
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            Error::DeserializationError(msg) => write!(f, "Deserialization error: {}", msg),
            Error::InvalidCacheEntry(msg) => write!(f, "Invalid cache entry: {}", msg),
            Error::VersionMismatch { expected, found } => {
                write!(
                    f,
                    "Cache version mismatch: expected {}, found {}",
                    expected, found
                )
            }
            Error::StoreError(msg) => write!(f, "Store error: {}", msg),
            Error::FetchError(msg) => write!(f, "Fetch error: {}", msg),
            Error::Cancelled => write!(f, "Fetch cancelled"),
            Error::QrError(msg) => write!(f, "QR encode error: {}", msg),
            Error::GatewayError(msg) => write!(f, "Gateway error: {}", msg),
            Error::FollowUpError(msg) => write!(f, "Follow-up error: {}", msg),
            Error::ConfigError(msg) => write!(f, "Config error: {}", msg),
            Error::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ============================================================================
// Conversions from other error types
// ============================================================================

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        if e.is_io() {
            Error::StoreError(e.to_string())
        } else if e.is_syntax() {
            Error::DeserializationError(e.to_string())
        } else {
            Error::SerializationError(e.to_string())
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::StoreError(e.to_string())
    }
}

impl From<String> for Error {
    fn from(e: String) -> Self {
        Error::Other(e)
    }
}

impl From<&str> for Error {
    fn from(e: &str) -> Self {
        Error::Other(e.to_string())
    }
}
