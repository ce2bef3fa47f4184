use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid field path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },
}
