use std::fmt;

use serde::{Deserialize, Serialize};

/// Lazy-load state of a persisted key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CacheState {
    /// The next access must load from durable storage first.
    Uncached,
    /// The in-memory copy reflects durable storage for this cache cycle.
    Cached,
}

impl fmt::Display for CacheState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uncached => write!(f, "uncached"),
            Self::Cached => write!(f, "cached"),
        }
    }
}

/// Out-of-band bookkeeping for one registered key.
///
/// Non-persisted keys never load, so they report as cached regardless of
/// the recorded state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyMeta {
    persisted: bool,
    state: CacheState,
}

impl KeyMeta {
    /// Metadata for a freshly registered key.
    pub fn new(persisted: bool) -> Self {
        Self {
            persisted,
            state: if persisted {
                CacheState::Uncached
            } else {
                CacheState::Cached
            },
        }
    }

    /// Whether writes are mirrored to durable storage.
    pub fn persisted(&self) -> bool {
        self.persisted
    }

    /// The current cache state.
    pub fn state(&self) -> CacheState {
        if self.persisted {
            self.state
        } else {
            CacheState::Cached
        }
    }

    /// Whether the in-memory copy is current.
    pub fn is_cached(&self) -> bool {
        self.state() == CacheState::Cached
    }

    /// Whether the next access must load from durable storage.
    pub fn needs_load(&self) -> bool {
        self.persisted && self.state == CacheState::Uncached
    }

    /// Record that the in-memory copy is current.
    pub fn mark_cached(&mut self) {
        self.state = CacheState::Cached;
    }

    /// Force a reload on the next access. No-op for non-persisted keys.
    pub fn invalidate(&mut self) {
        if self.persisted {
            self.state = CacheState::Uncached;
        }
    }

    /// Set the cache flag directly.
    pub fn set_cached(&mut self, cached: bool) {
        if cached {
            self.mark_cached();
        } else {
            self.invalidate();
        }
    }
}
