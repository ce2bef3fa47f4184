use std::collections::BTreeMap;

use serde_json::Value;
use stash_types::{ValueKind, RESERVED_CACHED, RESERVED_PERSISTED};
use tracing::{debug, info};

use crate::error::{RegistryError, RegistryResult};
use crate::meta::KeyMeta;

/// The live state of one registered key.
///
/// The user data is always a JSON object.
#[derive(Clone, Debug, PartialEq)]
pub struct RegisteredKey {
    data: Value,
    meta: KeyMeta,
}

impl RegisteredKey {
    /// The user data, without reserved fields.
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Mutable access to the user data.
    ///
    /// Callers must keep the root an object.
    pub fn data_mut(&mut self) -> &mut Value {
        &mut self.data
    }

    /// The user data as a standalone value.
    pub fn to_value(&self) -> Value {
        self.data.clone()
    }

    /// The key's bookkeeping record.
    pub fn meta(&self) -> &KeyMeta {
        &self.meta
    }

    /// Mutable access to the bookkeeping record.
    pub fn meta_mut(&mut self) -> &mut KeyMeta {
        &mut self.meta
    }

    /// Whether writes to this key are mirrored to durable storage.
    pub fn persisted(&self) -> bool {
        self.meta.persisted()
    }
}

/// Mapping from key name to its registered value and metadata.
///
/// Keys are kept in sorted order so bulk operations (clearing durable
/// storage, invalidating caches) visit them deterministically.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    entries: BTreeMap<String, RegisteredKey>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `schema` under `key`.
    ///
    /// The schema must be an object. It may carry a boolean `_persisted`
    /// flag (default `false`) but never `_cached`. Both reserved names are
    /// removed from the stored data and tracked in [`KeyMeta`] instead.
    pub fn register(&mut self, key: &str, schema: Value) -> RegistryResult<&mut RegisteredKey> {
        if self.entries.contains_key(key) {
            return Err(RegistryError::AlreadyRegistered {
                key: key.to_string(),
            });
        }

        let mut data = match schema {
            Value::Object(data) => data,
            other => {
                return Err(RegistryError::InvalidHandler {
                    key: key.to_string(),
                    found: ValueKind::of(&other).to_string(),
                })
            }
        };

        if data.contains_key(RESERVED_CACHED) {
            return Err(RegistryError::ReservedField {
                key: key.to_string(),
                field: RESERVED_CACHED.to_string(),
                reason: "managed by the store and cannot be supplied".into(),
            });
        }

        let persisted = match data.remove(RESERVED_PERSISTED) {
            None => false,
            Some(Value::Bool(persisted)) => persisted,
            Some(other) => {
                return Err(RegistryError::ReservedField {
                    key: key.to_string(),
                    field: RESERVED_PERSISTED.to_string(),
                    reason: format!("expected boolean, found {}", ValueKind::of(&other)),
                })
            }
        };

        info!(key, persisted, fields = data.len(), "key registered");
        let entry = self
            .entries
            .entry(key.to_string())
            .or_insert(RegisteredKey {
                data: Value::Object(data),
                meta: KeyMeta::new(persisted),
            });
        Ok(entry)
    }

    /// Look up a registered key.
    pub fn get(&self, key: &str) -> Option<&RegisteredKey> {
        self.entries.get(key)
    }

    /// Look up a registered key for mutation.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut RegisteredKey> {
        self.entries.get_mut(key)
    }

    /// Look up a registered key, failing with `NotRegistered`.
    pub fn require(&self, key: &str) -> RegistryResult<&RegisteredKey> {
        self.entries.get(key).ok_or_else(|| RegistryError::NotRegistered {
            key: key.to_string(),
        })
    }

    /// Look up a registered key for mutation, failing with `NotRegistered`.
    pub fn require_mut(&mut self, key: &str) -> RegistryResult<&mut RegisteredKey> {
        self.entries
            .get_mut(key)
            .ok_or_else(|| RegistryError::NotRegistered {
                key: key.to_string(),
            })
    }

    /// Whether `key` has a live registration.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// All registered keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Iterate over registered entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &RegisteredKey)> {
        self.entries.iter()
    }

    /// Number of registered keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every registration.
    pub fn clear(&mut self) {
        debug!(count = self.entries.len(), "registry cleared");
        self.entries.clear();
    }

    /// Mark every persisted key as needing a reload. Data is kept as-is.
    pub fn invalidate_all(&mut self) {
        for entry in self.entries.values_mut() {
            entry.meta.invalidate();
        }
        debug!(count = self.entries.len(), "registry caches invalidated");
    }
}
