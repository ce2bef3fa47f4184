//! Key registry for Stash.
//!
//! The registry maps each registered key to its live value and an
//! out-of-band metadata record. A key is registered once and lives until
//! the registry is cleared.
//!
//! # Architecture
//!
//! - **User data** is the schema object supplied at registration, with the
//!   reserved bookkeeping fields stripped. It is mutated in place by writes
//!   and by hydration from durable storage.
//! - **Metadata** ([`KeyMeta`]) records whether the key is persisted and,
//!   for persisted keys, whether the in-memory copy reflects durable storage
//!   ([`CacheState`]). It is never serialized with the user data.
//!
//! # Modules
//!
//! - [`error`]: Error types for registration
//! - [`meta`]: [`KeyMeta`] and [`CacheState`]
//! - [`registry`]: [`Registry`] and [`RegisteredKey`]

pub mod error;
pub mod meta;
pub mod registry;

pub use error::{RegistryError, RegistryResult};
pub use meta::{CacheState, KeyMeta};
pub use registry::{RegisteredKey, Registry};
