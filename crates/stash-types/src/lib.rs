//! Foundation types for Stash.
//!
//! Every other Stash crate depends on `stash-types`. User data is carried as
//! [`serde_json::Value`] throughout; this crate adds the vocabulary used to
//! reason about the *shape* of that data.
//!
//! # Key Types
//!
//! - [`ValueKind`]: Exhaustive kind classifier over `serde_json::Value`
//! - [`FieldPath`]: Location of a field inside a registered value
//! - [`RESERVED_CACHED`] / [`RESERVED_PERSISTED`]: Bookkeeping field names

pub mod error;
pub mod kind;
pub mod path;
pub mod reserved;

pub use error::TypeError;
pub use kind::ValueKind;
pub use path::FieldPath;
pub use reserved::{is_reserved, RESERVED_CACHED, RESERVED_PERSISTED};

/// Re-exported so downstream crates share one value representation.
pub use serde_json::Value;
