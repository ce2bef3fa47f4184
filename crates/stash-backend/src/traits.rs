use crate::error::BackendResult;

/// Durable key-value storage consumed by the store.
///
/// All implementations must satisfy these invariants:
/// - `get` returns exactly the last string passed to `set` for that key, or
///   `None` if the key was never set or was cleared.
/// - `set(key, None)` clears the entry and is a no-op for unknown keys.
/// - Keys are independent: touching one key never alters another.
/// - The backend never interprets the stored strings.
pub trait DurableBackend: Send + Sync {
    /// Read the serialized snapshot stored under `key`.
    ///
    /// Returns `Ok(None)` if nothing is stored.
    fn get(&self, key: &str) -> BackendResult<Option<String>>;

    /// Overwrite the entry for `key`, or clear it when `value` is `None`.
    fn set(&self, key: &str, value: Option<&str>) -> BackendResult<()>;

    /// Check that `key` can be stored by this backend at all.
    ///
    /// Backends that accept any string keep the default.
    fn check_key(&self, _key: &str) -> BackendResult<()> {
        Ok(())
    }

    /// Clear the entry for `key`.
    fn remove(&self, key: &str) -> BackendResult<()> {
        self.set(key, None)
    }

    /// Check whether anything is stored under `key`.
    fn contains(&self, key: &str) -> BackendResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}

impl<B: DurableBackend + ?Sized> DurableBackend for std::sync::Arc<B> {
    fn get(&self, key: &str) -> BackendResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: Option<&str>) -> BackendResult<()> {
        (**self).set(key, value)
    }

    fn check_key(&self, key: &str) -> BackendResult<()> {
        (**self).check_key(key)
    }
}
