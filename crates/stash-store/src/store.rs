use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard};

use serde_json::Value;
use stash_backend::{Codec, DurableBackend, FileBackend, InMemoryBackend, JsonCodec};
use stash_registry::{Registry, RegistryError};
use stash_schema::{merge, validate, validate_at};
use stash_types::{is_reserved, FieldPath, ValueKind, RESERVED_CACHED, RESERVED_PERSISTED};
use tracing::{debug, info};

use crate::config::{BackendConfig, StoreConfig};
use crate::error::{StoreError, StoreResult};
use crate::handle::{Accessed, Handle};

/// Mutable state guarded by the store's lock.
#[derive(Default)]
struct StoreState {
    registry: Registry,
    /// Plain fields set on the store under unregistered names.
    locals: BTreeMap<String, Value>,
}

/// The store facade.
///
/// Registered keys are exposed as [`Handle`]s. Unregistered names behave
/// as plain local fields with no validation or persistence.
///
/// All state sits behind a single lock that is held for the whole of each
/// operation, including backend calls. A lazy load therefore happens at
/// most once per cache cycle, and a write is readable as soon as it
/// returns, even with concurrent callers.
pub struct Store {
    state: Mutex<StoreState>,
    backend: Box<dyn DurableBackend>,
    codec: Box<dyn Codec>,
}

impl Store {
    /// Create a store over `backend` using the JSON codec.
    pub fn new(backend: impl DurableBackend + 'static) -> Self {
        Self::with_codec(backend, JsonCodec)
    }

    /// Create a store over `backend` with a custom codec.
    pub fn with_codec(backend: impl DurableBackend + 'static, codec: impl Codec + 'static) -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
            backend: Box::new(backend),
            codec: Box::new(codec),
        }
    }

    /// Create a store whose durable storage lives only in this process.
    pub fn in_memory() -> Self {
        Self::new(InMemoryBackend::new())
    }

    /// Create a store from configuration.
    pub fn from_config(config: &StoreConfig) -> StoreResult<Self> {
        let store = match &config.backend {
            BackendConfig::Memory => Self::in_memory(),
            BackendConfig::File { root } => {
                let backend = FileBackend::open(root)
                    .map_err(|e| StoreError::Config(format!("{}: {e}", root.display())))?;
                Self::new(backend)
            }
        };
        info!(backend = ?config.backend, "store opened");
        Ok(store)
    }

    // ---- Registration ----

    /// Register `schema` under `key` and return a handle on it.
    ///
    /// A plain local field with the same name is replaced by the
    /// registration. Keys the backend cannot store are refused up front.
    pub fn register(&self, key: &str, schema: Value) -> StoreResult<Handle<'_>> {
        self.backend
            .check_key(key)
            .map_err(|e| StoreError::backend(key, e))?;
        let mut state = self.lock()?;
        state.registry.register(key, schema)?;
        if state.locals.remove(key).is_some() {
            debug!(key, "registration replaced a local field");
        }
        Ok(Handle::new(self, key))
    }

    /// A handle on a registered key.
    pub fn handle(&self, key: &str) -> StoreResult<Handle<'_>> {
        let state = self.lock()?;
        state.registry.require(key)?;
        Ok(Handle::new(self, key))
    }

    /// Whether `key` has a live registration.
    pub fn is_registered(&self, key: &str) -> StoreResult<bool> {
        Ok(self.lock()?.registry.contains(key))
    }

    /// All registered keys, sorted.
    pub fn keys(&self) -> StoreResult<Vec<String>> {
        Ok(self.lock()?.registry.keys())
    }

    /// Whether the key's in-memory copy reflects durable storage.
    ///
    /// Always `true` for keys that are not persisted.
    pub fn is_cached(&self, key: &str) -> StoreResult<bool> {
        Ok(self.lock()?.registry.require(key)?.meta().is_cached())
    }

    /// Whether the key is mirrored to durable storage.
    pub fn is_persisted(&self, key: &str) -> StoreResult<bool> {
        Ok(self.lock()?.registry.require(key)?.persisted())
    }

    // ---- Facade property access ----

    /// Read a name on the store.
    ///
    /// Registered keys yield their root handle; other names yield the plain
    /// local field, if one was set.
    pub fn get(&self, name: &str) -> StoreResult<Option<Accessed<'_>>> {
        let state = self.lock()?;
        if state.registry.contains(name) {
            return Ok(Some(Accessed::Handle(Handle::new(self, name))));
        }
        Ok(state.locals.get(name).cloned().map(Accessed::Value))
    }

    /// Write a name on the store.
    ///
    /// Registered keys are reassigned as a whole (see [`Store::assign`]);
    /// other names are stored as plain local fields.
    pub fn set(&self, name: &str, value: Value) -> StoreResult<()> {
        let mut state = self.lock()?;
        if state.registry.contains(name) {
            return self.assign_locked(&mut state, name, value);
        }
        state.locals.insert(name.to_string(), value);
        Ok(())
    }

    /// Replace the whole value of a registered key.
    ///
    /// An uncached persisted key is loaded first, like any other write.
    /// `_cached` in `value` is ignored. `_persisted`, if supplied, must
    /// match the key's flag. The rest must have the shape of the current
    /// value. Persisted keys are written through immediately.
    pub fn assign(&self, key: &str, value: Value) -> StoreResult<()> {
        let mut state = self.lock()?;
        self.assign_locked(&mut state, key, value)
    }

    /// A snapshot of a registered key's user data.
    pub fn snapshot(&self, key: &str) -> StoreResult<Value> {
        self.read_at(key, &FieldPath::root())
    }

    // ---- Cache lifecycle ----

    /// Force every persisted key to reload from durable storage on its
    /// next access. In-memory data and durable data are kept.
    pub fn clear_cache(&self) -> StoreResult<()> {
        let mut state = self.lock()?;
        state.registry.invalidate_all();
        info!(keys = state.registry.len(), "cache cleared");
        Ok(())
    }

    /// Remove every registration. Durable storage is not touched.
    pub fn reset(&self) -> StoreResult<()> {
        let mut state = self.lock()?;
        let count = state.registry.len();
        state.registry.clear();
        info!(keys = count, "store reset");
        Ok(())
    }

    /// Clear the durable entry of every registered key.
    ///
    /// Durable entries under names that are not registered are left alone.
    pub fn clear_persistent_storage(&self) -> StoreResult<()> {
        let state = self.lock()?;
        let keys = state.registry.keys();
        for key in &keys {
            self.backend
                .set(key, None)
                .map_err(|e| StoreError::backend(key, e))?;
        }
        info!(keys = keys.len(), "persistent storage cleared");
        Ok(())
    }

    // ---- Interception internals ----

    pub(crate) fn read_at(&self, key: &str, path: &FieldPath) -> StoreResult<Value> {
        self.with_node(key, path, Value::clone)
    }

    /// Run `f` on the node at `path`, loading the key first if needed.
    pub(crate) fn with_node<R>(
        &self,
        key: &str,
        path: &FieldPath,
        f: impl FnOnce(&Value) -> R,
    ) -> StoreResult<R> {
        let mut state = self.lock()?;
        self.ensure_loaded(&mut state, key)?;
        let entry = state.registry.require(key)?;
        let node = resolve(entry.data(), path)
            .ok_or_else(|| StoreError::invalid_path(key, path, "no such field"))?;
        Ok(f(node))
    }

    pub(crate) fn read_reserved(&self, key: &str, field: &str) -> StoreResult<Value> {
        let state = self.lock()?;
        let meta = *state.registry.require(key)?.meta();
        Ok(Value::Bool(if field == RESERVED_CACHED {
            meta.is_cached()
        } else {
            meta.persisted()
        }))
    }

    /// Write `field` of the container at `parent`.
    pub(crate) fn write_at(
        &self,
        key: &str,
        parent: &FieldPath,
        field: &str,
        value: Value,
    ) -> StoreResult<()> {
        let mut state = self.lock()?;
        if parent.is_root() && is_reserved(field) {
            return write_reserved(&mut state.registry, key, field, value);
        }

        self.ensure_loaded(&mut state, key)?;
        let entry = state.registry.require_mut(key)?;
        let path = parent.child(field);
        let previous = entry.persisted().then(|| entry.to_value());

        let container = resolve_mut(entry.data_mut(), parent)
            .ok_or_else(|| StoreError::invalid_path(key, parent, "no such field"))?;
        assign_field(key, container, field, &path, value)?;
        debug!(key, path = %path, "field written");

        if let Some(previous) = previous {
            if let Err(e) = self.persist(key, entry.data()) {
                *entry.data_mut() = previous;
                return Err(e);
            }
        }
        Ok(())
    }

    fn assign_locked(&self, state: &mut StoreState, key: &str, value: Value) -> StoreResult<()> {
        self.ensure_loaded(state, key)?;
        let entry = state.registry.require_mut(key)?;
        let mut fields = match value {
            Value::Object(fields) => fields,
            other => {
                return Err(RegistryError::InvalidHandler {
                    key: key.to_string(),
                    found: ValueKind::of(&other).to_string(),
                }
                .into())
            }
        };

        fields.remove(RESERVED_CACHED);
        match fields.remove(RESERVED_PERSISTED) {
            None => {}
            Some(Value::Bool(persisted)) if persisted == entry.persisted() => {}
            Some(Value::Bool(_)) => {
                return Err(StoreError::ImmutableField {
                    key: key.to_string(),
                    field: RESERVED_PERSISTED.to_string(),
                })
            }
            Some(other) => {
                return Err(RegistryError::ReservedField {
                    key: key.to_string(),
                    field: RESERVED_PERSISTED.to_string(),
                    reason: format!("expected boolean, found {}", ValueKind::of(&other)),
                }
                .into())
            }
        }

        let candidate = Value::Object(fields);
        validate(entry.data(), &candidate).map_err(|e| StoreError::schema(key, e))?;

        let previous_meta = *entry.meta();
        let previous = std::mem::replace(entry.data_mut(), candidate);
        entry.meta_mut().mark_cached();
        debug!(key, "value reassigned");

        if entry.persisted() {
            if let Err(e) = self.persist(key, entry.data()) {
                *entry.data_mut() = previous;
                *entry.meta_mut() = previous_meta;
                return Err(e);
            }
        }
        Ok(())
    }

    /// Perform the lazy load for `key` if it is persisted and uncached.
    ///
    /// The key becomes cached whether or not durable storage had an entry.
    /// A failed load leaves both the data and the cache state untouched.
    fn ensure_loaded(&self, state: &mut StoreState, key: &str) -> StoreResult<()> {
        let entry = state.registry.require_mut(key)?;
        if !entry.meta().needs_load() {
            return Ok(());
        }

        let stored = self
            .backend
            .get(key)
            .map_err(|e| StoreError::backend(key, e))?;
        match stored {
            Some(stored) => {
                let persisted = self
                    .codec
                    .decode(&stored)
                    .map_err(|e| StoreError::backend(key, e))?;
                merge(entry.data_mut(), &persisted).map_err(|e| StoreError::schema(key, e))?;
                debug!(key, "lazy load hydrated from durable storage");
            }
            None => debug!(key, "lazy load found nothing in durable storage"),
        }
        entry.meta_mut().mark_cached();
        Ok(())
    }

    fn persist(&self, key: &str, data: &Value) -> StoreResult<()> {
        let encoded = self
            .codec
            .encode(data)
            .map_err(|e| StoreError::backend(key, e))?;
        self.backend
            .set(key, Some(&encoded))
            .map_err(|e| StoreError::backend(key, e))?;
        debug!(key, bytes = encoded.len(), "written through to durable storage");
        Ok(())
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, StoreState>> {
        self.state
            .lock()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Store");
        match self.state.lock() {
            Ok(state) => debug
                .field("keys", &state.registry.keys())
                .field("locals", &state.locals.len()),
            Err(_) => debug.field("state", &"<poisoned>"),
        };
        debug.finish()
    }
}

fn write_reserved(
    registry: &mut Registry,
    key: &str,
    field: &str,
    value: Value,
) -> StoreResult<()> {
    let entry = registry.require_mut(key)?;
    match value {
        Value::Bool(cached) if field == RESERVED_CACHED => {
            entry.meta_mut().set_cached(cached);
            debug!(key, cached, "cache flag set directly");
            Ok(())
        }
        Value::Bool(persisted) if persisted == entry.persisted() => Ok(()),
        Value::Bool(_) => Err(StoreError::ImmutableField {
            key: key.to_string(),
            field: field.to_string(),
        }),
        other => Err(RegistryError::ReservedField {
            key: key.to_string(),
            field: field.to_string(),
            reason: format!("expected boolean, found {}", ValueKind::of(&other)),
        }
        .into()),
    }
}

/// Apply one field write to `container`, checking it first.
fn assign_field(
    key: &str,
    container: &mut Value,
    field: &str,
    path: &FieldPath,
    value: Value,
) -> StoreResult<()> {
    let invalid = |reason: &str| StoreError::InvalidAssignment {
        key: key.to_string(),
        path: path.clone(),
        reason: reason.to_string(),
    };

    match container {
        Value::Object(fields) => {
            let current = fields
                .get_mut(field)
                .ok_or_else(|| invalid("field is not declared by the schema"))?;
            validate_at(current, &value, path).map_err(|e| StoreError::schema(key, e))?;
            *current = value;
            Ok(())
        }
        Value::Array(items) => match FieldPath::as_index(field) {
            Some(index) if index < items.len() => {
                validate_at(&items[index], &value, path)
                    .map_err(|e| StoreError::schema(key, e))?;
                items[index] = value;
                Ok(())
            }
            Some(index) if index == items.len() => {
                items.push(value);
                Ok(())
            }
            Some(_) => Err(invalid("index is past the end of the array")),
            None => Err(invalid("array elements are addressed by index")),
        },
        other => Err(StoreError::invalid_path(
            key,
            path.parent(),
            format!("{} has no fields", ValueKind::of(other)),
        )),
    }
}

fn child<'v>(node: &'v Value, segment: &str) -> Option<&'v Value> {
    match node {
        Value::Object(fields) => fields.get(segment),
        Value::Array(items) => FieldPath::as_index(segment).and_then(|index| items.get(index)),
        _ => None,
    }
}

fn child_mut<'v>(node: &'v mut Value, segment: &str) -> Option<&'v mut Value> {
    match node {
        Value::Object(fields) => fields.get_mut(segment),
        Value::Array(items) => {
            FieldPath::as_index(segment).and_then(move |index| items.get_mut(index))
        }
        _ => None,
    }
}

fn resolve<'v>(root: &'v Value, path: &FieldPath) -> Option<&'v Value> {
    path.segments()
        .iter()
        .try_fold(root, |node, segment| child(node, segment))
}

fn resolve_mut<'v>(root: &'v mut Value, path: &FieldPath) -> Option<&'v mut Value> {
    path.segments()
        .iter()
        .try_fold(root, |node, segment| child_mut(node, segment))
}
