//! Error types for durable backends and codecs.

use thiserror::Error;

/// Errors from backend and codec operations.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The key cannot be used as a storage name.
    #[error("invalid key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },

    /// Encoding or decoding a stored snapshot failed.
    #[error("codec error: {0}")]
    Codec(String),

    /// I/O error from the underlying storage.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A lock protecting backend state was poisoned.
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),
}

/// Result alias for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;
