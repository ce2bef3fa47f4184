//! Durable storage adapters for Stash.
//!
//! Stash treats durable storage as an external collaborator with a
//! two-operation contract: fetch the serialized snapshot stored under a key,
//! or overwrite (or clear) it. This crate defines that contract and the
//! codec that turns registered values into the stored strings.
//!
//! # Storage Backends
//!
//! All backends implement the [`DurableBackend`] trait:
//!
//! - [`InMemoryBackend`] -- `HashMap`-based backend for tests and embedding,
//!   with read/write counters
//! - [`FileBackend`] -- one file per key under a root directory
//!
//! # Design Rules
//!
//! 1. A backend never interprets the strings it stores.
//! 2. `set(key, None)` clears the entry; a later `get` returns `None`.
//! 3. All I/O errors are propagated, never silently ignored.

pub mod codec;
pub mod error;
pub mod file;
pub mod memory;
pub mod names;
pub mod traits;

pub use codec::{Codec, JsonCodec};
pub use error::{BackendError, BackendResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
pub use names::validate_key_name;
pub use traits::DurableBackend;
