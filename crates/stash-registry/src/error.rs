//! Error types for registry operations.

use thiserror::Error;

/// Errors that can occur while registering or looking up keys.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// The key already has a live registration.
    #[error("key already registered: {key}")]
    AlreadyRegistered { key: String },

    /// The registration value is not an object.
    #[error("invalid handler for {key}: expected an object, found {found}")]
    InvalidHandler { key: String, found: String },

    /// A reserved bookkeeping field was supplied or has the wrong type.
    #[error("reserved field {field} on {key}: {reason}")]
    ReservedField {
        key: String,
        field: String,
        reason: String,
    },

    /// The key has no live registration.
    #[error("key not registered: {key}")]
    NotRegistered { key: String },
}

/// Convenience type alias for registry operations.
pub type RegistryResult<T> = std::result::Result<T, RegistryError>;
