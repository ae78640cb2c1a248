use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::{validate_key, EntryStore};

/// Directory-backed entry store: one file per entry.
///
/// On-disk layout:
/// ```text
/// <root>/
///   simple_chain_qr          entry value, UTF-8 text
///   simple_chain_qr.corrupt  another entry
/// ```
///
/// `set` writes to a temporary file in the same directory, syncs it, then
/// renames it over the target, so a crash leaves either the old value or the
/// new one and never a truncated file.
#[derive(Debug, Clone)]
pub struct FileEntryStore {
    root: PathBuf,
}

impl FileEntryStore {
    /// Open (or create) a store rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// The directory holding the entries.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file backing `key`.
    pub fn entry_path(&self, key: &str) -> StoreResult<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

impl EntryStore for FileEntryStore {
    fn get_bytes(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let path = self.entry_path(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_bytes(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        let path = self.entry_path(key)?;
        let mut tmp = NamedTempFile::new_in(&self.root)?;
        tmp.write_all(value)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| StoreError::Persist {
            key: key.to_string(),
            source: e.error,
        })?;
        debug!(key, bytes = value.len(), "entry written");
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<bool> {
        let path = self.entry_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(key, "entry removed");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
