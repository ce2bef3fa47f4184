use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Configuration for a [`Store`](crate::Store).
///
/// ```toml
/// [backend]
/// kind = "file"
/// root = "/var/lib/app/stash"
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Which durable backend persisted keys are written to.
    pub backend: BackendConfig,
}

/// Durable backend selection.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendConfig {
    /// Process-local storage; nothing survives a restart.
    #[default]
    Memory,
    /// One file per key under `root`.
    File { root: PathBuf },
}

impl StoreConfig {
    /// A configuration backed by files under `root`.
    pub fn file(root: impl Into<PathBuf>) -> Self {
        Self {
            backend: BackendConfig::File { root: root.into() },
        }
    }

    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> StoreResult<Self> {
        toml::from_str(text).map_err(|e| StoreError::Config(e.to_string()))
    }

    /// Load a configuration from a TOML file.
    pub fn load(path: &Path) -> StoreResult<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| StoreError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Render the configuration as TOML.
    pub fn to_toml_string(&self) -> StoreResult<String> {
        toml::to_string(self).map_err(|e| StoreError::Config(e.to_string()))
    }
}
