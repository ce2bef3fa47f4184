use stash_backend::BackendError;
use stash_registry::RegistryError;
use stash_schema::SchemaError;
use stash_types::FieldPath;
use thiserror::Error;

/// Errors surfaced by store operations.
///
/// Every error is returned before the store is mutated, so a failed
/// operation leaves the store exactly as it was.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Registration or lookup failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A value's shape disagrees with the registered schema.
    #[error("{key}: {source}")]
    Schema {
        key: String,
        #[source]
        source: SchemaError,
    },

    /// A write tried to add a field the schema does not declare.
    #[error("invalid assignment to {key}.{path}: {reason}")]
    InvalidAssignment {
        key: String,
        path: FieldPath,
        reason: String,
    },

    /// A write tried to change `_persisted`.
    #[error("field {field} of {key} is immutable")]
    ImmutableField { key: String, field: String },

    /// A path does not lead to a field of the registered value.
    #[error("invalid path {path:?} on {key}: {reason}")]
    InvalidPath {
        key: String,
        path: String,
        reason: String,
    },

    /// The durable backend or codec failed.
    #[error("backend error for {key}: {source}")]
    Backend {
        key: String,
        #[source]
        source: BackendError,
    },

    /// The store configuration could not be loaded or applied.
    #[error("config error: {0}")]
    Config(String),

    /// The store's state lock was poisoned by a panicking thread.
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),
}

/// The error kinds callers match on, independent of error payloads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidHandler,
    AlreadyRegistered,
    ReservedField,
    NotRegistered,
    SchemaMismatch,
    TypeMismatch,
    InvalidAssignment,
    ImmutableField,
    InvalidPath,
    Backend,
    Config,
    LockPoisoned,
}

impl StoreError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Registry(RegistryError::InvalidHandler { .. }) => ErrorKind::InvalidHandler,
            Self::Registry(RegistryError::AlreadyRegistered { .. }) => {
                ErrorKind::AlreadyRegistered
            }
            Self::Registry(RegistryError::ReservedField { .. }) => ErrorKind::ReservedField,
            Self::Registry(RegistryError::NotRegistered { .. }) => ErrorKind::NotRegistered,
            Self::Schema {
                source: SchemaError::SchemaMismatch { .. },
                ..
            } => ErrorKind::SchemaMismatch,
            Self::Schema {
                source: SchemaError::TypeMismatch { .. },
                ..
            } => ErrorKind::TypeMismatch,
            Self::InvalidAssignment { .. } => ErrorKind::InvalidAssignment,
            Self::ImmutableField { .. } => ErrorKind::ImmutableField,
            Self::InvalidPath { .. } => ErrorKind::InvalidPath,
            Self::Backend { .. } => ErrorKind::Backend,
            Self::Config(_) => ErrorKind::Config,
            Self::LockPoisoned(_) => ErrorKind::LockPoisoned,
        }
    }

    pub(crate) fn schema(key: &str, source: SchemaError) -> Self {
        Self::Schema {
            key: key.to_string(),
            source,
        }
    }

    pub(crate) fn backend(key: &str, source: BackendError) -> Self {
        Self::Backend {
            key: key.to_string(),
            source,
        }
    }

    pub(crate) fn invalid_path(key: &str, path: impl ToString, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            key: key.to_string(),
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
