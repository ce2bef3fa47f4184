//! File-backed durable storage.
//!
//! Each key is stored as `<root>/<key>.json`. Writes go to a temporary file
//! in the same directory which is then renamed over the target, so a reader
//! never observes a half-written snapshot.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{BackendError, BackendResult};
use crate::names::validate_key_name;
use crate::traits::DurableBackend;

/// File extension used for stored snapshots.
const EXTENSION: &str = "json";

/// A [`DurableBackend`] that keeps one file per key under a root directory.
#[derive(Debug, Clone)]
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    /// Open a backend rooted at `root`, creating the directory if needed.
    pub fn open(root: impl AsRef<Path>) -> BackendResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        debug!(root = %root.display(), "file backend opened");
        Ok(Self { root })
    }

    /// The root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The file that holds `key`.
    pub fn path_for(&self, key: &str) -> BackendResult<PathBuf> {
        validate_key_name(key)?;
        Ok(self.root.join(format!("{key}.{EXTENSION}")))
    }

    /// Sorted list of keys that currently have a stored snapshot.
    pub fn keys(&self) -> BackendResult<Vec<String>> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                keys.push(stem.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}

impl DurableBackend for FileBackend {
    fn check_key(&self, key: &str) -> BackendResult<()> {
        validate_key_name(key)
    }

    fn get(&self, key: &str) -> BackendResult<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(BackendError::Io(e)),
        }
    }

    fn set(&self, key: &str, value: Option<&str>) -> BackendResult<()> {
        let path = self.path_for(key)?;
        let Some(value) = value else {
            return match fs::remove_file(&path) {
                Ok(()) => {
                    debug!(key, "file backend entry cleared");
                    Ok(())
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(BackendError::Io(e)),
            };
        };

        let mut tmp = NamedTempFile::new_in(&self.root)?;
        tmp.write_all(value.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| BackendError::Io(e.error))?;
        debug!(key, len = value.len(), "file backend entry written");
        Ok(())
    }
}
