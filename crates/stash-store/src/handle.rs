//! Intercepting accessors for registered values.
//!
//! A [`Handle`] addresses one node (the whole value or a nested object or
//! array) of a registered key. Every read and write made through a handle
//! is routed through the store, which lazily loads persisted keys, checks
//! writes against the registered shape, and writes accepted changes
//! through to durable storage. Reading an object or array through a handle
//! yields another handle, so deep mutations take the same path as
//! top-level ones.

use std::fmt;

use serde_json::Value;
use stash_types::{is_reserved, FieldPath, ValueKind};

use crate::error::{StoreError, StoreResult};
use crate::store::Store;

/// The result of reading a field through a [`Handle`].
#[derive(Clone, Debug)]
pub enum Accessed<'s> {
    /// A scalar or null leaf, copied out of the store.
    Value(Value),
    /// An object or array, wrapped so further access stays intercepted.
    Handle(Handle<'s>),
}

impl<'s> Accessed<'s> {
    /// Returns `true` if the field is an object or array.
    pub fn is_handle(&self) -> bool {
        matches!(self, Self::Handle(_))
    }

    /// The leaf value, if the field is not a container.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            Self::Handle(_) => None,
        }
    }

    /// The nested handle, if the field is a container.
    pub fn as_handle(&self) -> Option<&Handle<'s>> {
        match self {
            Self::Handle(handle) => Some(handle),
            Self::Value(_) => None,
        }
    }

    /// Convert into the nested handle, if the field is a container.
    pub fn into_handle(self) -> Option<Handle<'s>> {
        match self {
            Self::Handle(handle) => Some(handle),
            Self::Value(_) => None,
        }
    }

    /// Materialize the field as a plain value.
    ///
    /// For containers this reads a snapshot of the whole subtree.
    pub fn into_value(self) -> StoreResult<Value> {
        match self {
            Self::Value(value) => Ok(value),
            Self::Handle(handle) => handle.value(),
        }
    }
}

/// An intercepted view of one node of a registered key.
///
/// Handles are cheap to clone and hold no data of their own; they always
/// observe the store's current state. A handle whose key has been removed
/// by [`Store::reset`] fails every operation with `NotRegistered`.
#[derive(Clone)]
pub struct Handle<'s> {
    store: &'s Store,
    key: String,
    path: FieldPath,
}

impl<'s> Handle<'s> {
    pub(crate) fn new(store: &'s Store, key: &str) -> Self {
        Self {
            store,
            key: key.to_string(),
            path: FieldPath::root(),
        }
    }

    /// The registered key this handle belongs to.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The location of this handle's node inside the key's value.
    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    /// Returns `true` for the handle on the whole registered value.
    pub fn is_root(&self) -> bool {
        self.path.is_root()
    }

    /// A handle on a child node, without reading anything.
    pub fn at(&self, field: &str) -> Handle<'s> {
        self.with_path(self.path.child(field))
    }

    /// Read a field of this node.
    ///
    /// On the root handle, the reserved names `_cached` and `_persisted`
    /// read the key's bookkeeping flags. Those reads never trigger the lazy
    /// load, so `_cached` reports `false` until something else loads an
    /// uncached persisted key.
    pub fn get(&self, field: &str) -> StoreResult<Accessed<'s>> {
        self.access(self.path.child(field))
    }

    /// Read a dotted path relative to this node, e.g. `"theme.colors.0"`.
    pub fn get_path(&self, dotted: &str) -> StoreResult<Accessed<'s>> {
        let relative = self.parse(dotted)?;
        self.access(self.path.join(&relative))
    }

    /// Write a field of this node.
    ///
    /// The field must already exist on objects; arrays accept any index up
    /// to and including their length.
    pub fn set(&self, field: &str, value: impl Into<Value>) -> StoreResult<()> {
        self.write(self.path.child(field), value.into())
    }

    /// Write a dotted path relative to this node.
    ///
    /// The empty path replaces this node itself.
    pub fn set_path(&self, dotted: &str, value: impl Into<Value>) -> StoreResult<()> {
        let relative = self.parse(dotted)?;
        self.write(self.path.join(&relative), value.into())
    }

    /// Replace this node. On the root handle this is a whole-key
    /// reassignment.
    pub fn assign(&self, value: impl Into<Value>) -> StoreResult<()> {
        self.write(self.path.clone(), value.into())
    }

    /// A snapshot of this node's current value.
    pub fn value(&self) -> StoreResult<Value> {
        self.store.read_at(&self.key, &self.path)
    }

    /// Whether the key's in-memory copy reflects durable storage.
    pub fn cached(&self) -> StoreResult<bool> {
        self.store.is_cached(&self.key)
    }

    /// Whether the key is mirrored to durable storage.
    pub fn persisted(&self) -> StoreResult<bool> {
        self.store.is_persisted(&self.key)
    }

    fn with_path(&self, path: FieldPath) -> Handle<'s> {
        Handle {
            store: self.store,
            key: self.key.clone(),
            path,
        }
    }

    fn parse(&self, dotted: &str) -> StoreResult<FieldPath> {
        FieldPath::parse(dotted)
            .map_err(|e| StoreError::invalid_path(&self.key, dotted, e.to_string()))
    }

    fn access(&self, path: FieldPath) -> StoreResult<Accessed<'s>> {
        if let [field] = path.segments() {
            if is_reserved(field) {
                return Ok(Accessed::Value(self.store.read_reserved(&self.key, field)?));
            }
        }
        if path.is_root() {
            return Ok(Accessed::Handle(self.with_path(path)));
        }

        let leaf = self.store.with_node(&self.key, &path, |node| {
            if ValueKind::of(node).is_container() {
                None
            } else {
                Some(node.clone())
            }
        })?;
        Ok(match leaf {
            Some(value) => Accessed::Value(value),
            None => Accessed::Handle(self.with_path(path)),
        })
    }

    fn write(&self, mut path: FieldPath, value: Value) -> StoreResult<()> {
        match path.pop() {
            None => self.store.assign(&self.key, value),
            Some(field) => self.store.write_at(&self.key, &path, &field, value),
        }
    }
}

impl fmt::Debug for Handle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("key", &self.key)
            .field("path", &self.path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;
    use stash_backend::InMemoryBackend;

    fn profile_store() -> Store {
        let store = Store::new(InMemoryBackend::new());
        store
            .register(
                "profile",
                json!({
                    "name": "",
                    "age": 0,
                    "address": {"city": "", "geo": {"lat": 0.0, "lng": 0.0}},
                    "tags": [],
                }),
            )
            .unwrap();
        store
    }

    #[test]
    fn scalar_fields_read_as_values() {
        let store = profile_store();
        let profile = store.handle("profile").unwrap();
        let name = profile.get("name").unwrap();
        assert_eq!(name.as_value(), Some(&json!("")));
        assert!(!name.is_handle());
    }

    #[test]
    fn containers_read_as_handles() {
        let store = profile_store();
        let profile = store.handle("profile").unwrap();

        let address = profile.get("address").unwrap().into_handle().unwrap();
        assert_eq!(address.path().to_string(), "address");
        let geo = address.get("geo").unwrap().into_handle().unwrap();
        assert_eq!(geo.path().to_string(), "address.geo");

        assert!(profile.get("tags").unwrap().is_handle());
    }

    #[test]
    fn nested_writes_go_through_the_same_path() {
        let store = profile_store();
        let profile = store.handle("profile").unwrap();
        let geo = profile.at("address").at("geo");

        geo.set("lat", 51.5).unwrap();
        assert_eq!(
            profile.get_path("address.geo.lat").unwrap().as_value(),
            Some(&json!(51.5))
        );
    }

    #[test]
    fn undeclared_fields_are_rejected_at_every_depth() {
        let store = profile_store();
        let profile = store.handle("profile").unwrap();

        let top = profile.set("nickname", "x").unwrap_err();
        assert_eq!(top.kind(), ErrorKind::InvalidAssignment);

        let nested = profile.at("address").set("zip", "123").unwrap_err();
        assert_eq!(nested.kind(), ErrorKind::InvalidAssignment);

        let deep = profile.set_path("address.geo.alt", 10).unwrap_err();
        assert_eq!(deep.kind(), ErrorKind::InvalidAssignment);

        assert_eq!(
            profile.get("address").unwrap().into_value().unwrap(),
            json!({"city": "", "geo": {"lat": 0.0, "lng": 0.0}})
        );
    }

    #[test]
    fn array_appends_accept_any_shape() {
        let store = profile_store();
        let tags = store.handle("profile").unwrap().at("tags");

        tags.set("0", "rust").unwrap();
        tags.set("1", json!({"label": "nested"})).unwrap();
        assert_eq!(tags.value().unwrap(), json!(["rust", {"label": "nested"}]));
        assert_eq!(
            tags.get("1").unwrap().into_handle().unwrap().get("label").unwrap().as_value(),
            Some(&json!("nested"))
        );
    }

    #[test]
    fn array_replacements_keep_element_shape() {
        let store = profile_store();
        let tags = store.handle("profile").unwrap().at("tags");
        tags.set("0", "text").unwrap();
        tags.set("1", json!({"a": 1})).unwrap();

        assert_eq!(
            tags.set("0", json!({"now": "object"})).unwrap_err().kind(),
            ErrorKind::SchemaMismatch
        );
        assert_eq!(tags.set("1", 42).unwrap_err().kind(), ErrorKind::SchemaMismatch);
        assert_eq!(
            tags.set("1", json!({"b": 2})).unwrap_err().kind(),
            ErrorKind::SchemaMismatch
        );
        assert_eq!(tags.value().unwrap(), json!(["text", {"a": 1}]));

        tags.set("0", "replaced").unwrap();
        tags.at("1").set("a", 2).unwrap();
        assert_eq!(tags.value().unwrap(), json!(["replaced", {"a": 2}]));
    }

    #[test]
    fn whole_array_replacement_keeps_indices() {
        let store = profile_store();
        let profile = store.handle("profile").unwrap();
        profile.at("tags").set("0", "a").unwrap();

        profile.set("tags", json!(["b"])).unwrap();
        assert_eq!(
            profile.set("tags", json!(["b", "c"])).unwrap_err().kind(),
            ErrorKind::SchemaMismatch
        );
        assert_eq!(
            profile.set("tags", json!([])).unwrap_err().kind(),
            ErrorKind::SchemaMismatch
        );
        assert_eq!(profile.get("tags").unwrap().into_value().unwrap(), json!(["b"]));
    }

    #[test]
    fn array_holes_and_names_are_rejected() {
        let store = profile_store();
        let tags = store.handle("profile").unwrap().at("tags");

        assert_eq!(tags.set("3", "x").unwrap_err().kind(), ErrorKind::InvalidAssignment);
        assert_eq!(tags.set("first", "x").unwrap_err().kind(), ErrorKind::InvalidAssignment);
        assert_eq!(tags.value().unwrap(), json!([]));
    }

    #[test]
    fn kind_changes_are_schema_mismatches() {
        let store = profile_store();
        let profile = store.handle("profile").unwrap();

        assert_eq!(profile.set("age", "old").unwrap_err().kind(), ErrorKind::SchemaMismatch);
        assert_eq!(
            profile.set("address", json!({"city": "Oslo"})).unwrap_err().kind(),
            ErrorKind::SchemaMismatch
        );
        assert_eq!(
            profile.set("tags", json!({})).unwrap_err().kind(),
            ErrorKind::SchemaMismatch
        );
    }

    #[test]
    fn whole_subtree_replacement_is_validated() {
        let store = profile_store();
        let address = store.handle("profile").unwrap().at("address");

        address
            .assign(json!({"city": "Oslo", "geo": {"lat": 59.9, "lng": 10.7}}))
            .unwrap();
        assert_eq!(
            address.get("city").unwrap().as_value(),
            Some(&json!("Oslo"))
        );
        assert!(address.assign(json!({"city": "Oslo"})).is_err());
    }

    #[test]
    fn reading_unknown_fields_is_invalid_path() {
        let store = profile_store();
        let profile = store.handle("profile").unwrap();
        assert_eq!(profile.get("missing").unwrap_err().kind(), ErrorKind::InvalidPath);
        assert_eq!(
            profile.get_path("name.first").unwrap_err().kind(),
            ErrorKind::InvalidPath
        );
        assert_eq!(profile.get_path("a..b").unwrap_err().kind(), ErrorKind::InvalidPath);
    }

    #[test]
    fn writing_below_a_scalar_is_invalid_path() {
        let store = profile_store();
        let err = store
            .handle("profile")
            .unwrap()
            .set_path("name.first", "x")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidPath);
    }

    #[test]
    fn empty_relative_path_addresses_the_node() {
        let store = profile_store();
        let profile = store.handle("profile").unwrap();
        let same = profile.get_path("").unwrap().into_handle().unwrap();
        assert!(same.is_root());

        let city = profile.at("address").at("city");
        city.set_path("", "Bergen").unwrap();
        assert_eq!(
            profile.get_path("address.city").unwrap().as_value(),
            Some(&json!("Bergen"))
        );
    }

    #[test]
    fn reserved_names_read_metadata_on_root_only() {
        let store = profile_store();
        let profile = store.handle("profile").unwrap();
        assert_eq!(profile.get("_cached").unwrap().as_value(), Some(&json!(true)));
        assert_eq!(profile.get("_persisted").unwrap().as_value(), Some(&json!(false)));
        assert_eq!(
            profile.at("address").get("_cached").unwrap_err().kind(),
            ErrorKind::InvalidPath
        );
    }

    #[test]
    fn debug_shows_key_and_path() {
        let store = profile_store();
        let geo = store.handle("profile").unwrap().at("address").at("geo");
        let rendered = format!("{geo:?}");
        assert!(rendered.contains("profile"));
        assert!(rendered.contains("geo"));
    }
}
