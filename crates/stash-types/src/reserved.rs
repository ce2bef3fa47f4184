//! Names of the bookkeeping fields attached to every registered key.
//!
//! The flags themselves live out of band in the registry; these names are
//! only recognized at the top level of a registered value, where callers
//! may still read or write them.

/// Set once the in-memory copy reflects durable storage.
pub const RESERVED_CACHED: &str = "_cached";

/// Immutable after registration; marks a key as mirrored to durable storage.
pub const RESERVED_PERSISTED: &str = "_persisted";

/// Returns `true` if `name` is one of the reserved bookkeeping fields.
pub fn is_reserved(name: &str) -> bool {
    name == RESERVED_CACHED || name == RESERVED_PERSISTED
}
