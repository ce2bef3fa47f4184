//! Intercepting, lazily persisted key-value store.
//!
//! Application code registers a schema object under a key and then reads
//! and writes it through [`Handle`]s. Every access is intercepted:
//!
//! - writes are checked against the registered shape before they are
//!   applied, and undeclared fields are rejected at every object depth;
//! - persisted keys load from durable storage on their first access in
//!   each cache cycle, and every accepted write is written through;
//! - nested objects and arrays are returned as handles, so deep writes
//!   follow the same path as top-level ones.
//!
//! ```
//! use serde_json::json;
//! use stash_store::Store;
//!
//! let store = Store::in_memory();
//! let prefs = store
//!     .register("prefs", json!({"theme": "light", "_persisted": true}))
//!     .unwrap();
//! prefs.set("theme", "dark").unwrap();
//! assert!(prefs.set("font", "mono").is_err());
//! assert_eq!(store.snapshot("prefs").unwrap(), json!({"theme": "dark"}));
//! ```
//!
//! # Modules
//!
//! - [`store`] -- the [`Store`] facade and cache lifecycle
//! - [`handle`] -- [`Handle`] and [`Accessed`], the intercepting accessors
//! - [`config`] -- [`StoreConfig`], TOML-loadable backend selection
//! - [`error`] -- [`StoreError`] and [`ErrorKind`]

pub mod config;
pub mod error;
pub mod handle;
pub mod store;

pub use config::{BackendConfig, StoreConfig};
pub use error::{ErrorKind, StoreError, StoreResult};
pub use handle::{Accessed, Handle};
pub use store::Store;

// Re-export the pieces callers need to build a store.
pub use stash_backend::{Codec, DurableBackend, FileBackend, InMemoryBackend, JsonCodec};
pub use stash_types::{FieldPath, Value, ValueKind};
