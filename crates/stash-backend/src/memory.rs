use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use crate::error::{BackendError, BackendResult};
use crate::traits::DurableBackend;

/// In-memory, HashMap-based durable backend.
///
/// Intended for tests and embedding. Entries are held behind a `RwLock`.
/// Every `get` and `set` issued through the [`DurableBackend`] trait is
/// counted, which makes the store's lazy-load and write-through behavior
/// observable.
pub struct InMemoryBackend {
    entries: RwLock<HashMap<String, String>>,
    gets: AtomicUsize,
    sets: AtomicUsize,
}

impl InMemoryBackend {
    /// Create a new empty backend.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            gets: AtomicUsize::new(0),
            sets: AtomicUsize::new(0),
        }
    }

    /// Number of `get` calls served so far.
    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    /// Number of `set` calls served so far.
    pub fn set_count(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    /// Reset both call counters to zero.
    pub fn reset_counts(&self) {
        self.gets.store(0, Ordering::SeqCst);
        self.sets.store(0, Ordering::SeqCst);
    }

    /// Read an entry without counting it as a backend call.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .expect("lock poisoned")
            .get(key)
            .cloned()
    }

    /// Write an entry without counting it as a backend call.
    ///
    /// Simulates a change made out of band, e.g. by another process.
    pub fn insert_raw(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries
            .write()
            .expect("lock poisoned")
            .insert(key.into(), value.into());
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.read().expect("lock poisoned").len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.read().expect("lock poisoned").is_empty()
    }

    /// Sorted list of stored keys.
    pub fn keys(&self) -> Vec<String> {
        let map = self.entries.read().expect("lock poisoned");
        let mut keys: Vec<String> = map.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DurableBackend for InMemoryBackend {
    fn get(&self, key: &str) -> BackendResult<Option<String>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        let map = self
            .entries
            .read()
            .map_err(|e| BackendError::LockPoisoned(e.to_string()))?;
        Ok(map.get(key).cloned())
    }

    fn set(&self, key: &str, value: Option<&str>) -> BackendResult<()> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        let mut map = self
            .entries
            .write()
            .map_err(|e| BackendError::LockPoisoned(e.to_string()))?;
        match value {
            Some(value) => {
                map.insert(key.to_string(), value.to_string());
            }
            None => {
                map.remove(key);
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBackend")
            .field("entry_count", &self.len())
            .field("gets", &self.get_count())
            .field("sets", &self.set_count())
            .finish()
    }
}
