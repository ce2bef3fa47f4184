//! Error types for schema checks.

use stash_types::{FieldPath, ValueKind};
use thiserror::Error;

/// Errors raised when a value's shape disagrees with a registered schema.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
    /// A field is missing on one side, or the two sides disagree in kind.
    #[error("schema mismatch at {path}: {reason}")]
    SchemaMismatch { path: FieldPath, reason: String },

    /// A hydrated leaf has a different kind than the schema field.
    #[error("type mismatch at {path}: expected {expected}, found {found}")]
    TypeMismatch {
        path: FieldPath,
        expected: ValueKind,
        found: ValueKind,
    },
}

impl SchemaError {
    /// The path of the offending field.
    pub fn path(&self) -> &FieldPath {
        match self {
            Self::SchemaMismatch { path, .. } | Self::TypeMismatch { path, .. } => path,
        }
    }
}

/// Convenience alias for schema results.
pub type SchemaResult<T> = Result<T, SchemaError>;
