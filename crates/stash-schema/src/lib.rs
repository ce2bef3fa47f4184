//! Structural schema checks for Stash.
//!
//! A registered value's shape is fixed at registration time. This crate
//! provides the two recursive operations that enforce that shape:
//!
//! - [`validate`] -- the Structural Validator. Decides whether a candidate
//!   value (an assignment) has the same shape as a reference value (the
//!   current data at that path), in both directions.
//! - [`merge`] -- the Prop Merger. Hydrates a registered value from
//!   persisted data: the target decides which fields exist, the source
//!   decides their leaf values.
//!
//! # Key Types
//!
//! - [`SchemaError`] -- `SchemaMismatch` / `TypeMismatch`, each carrying the
//!   [`FieldPath`](stash_types::FieldPath) of the offending field

pub mod error;
pub mod merge;
pub mod validate;

pub use error::{SchemaError, SchemaResult};
pub use merge::{merge, merge_at};
pub use validate::{validate, validate_at};
