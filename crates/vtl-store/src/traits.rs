use crate::error::{StoreError, StoreResult};

/// Key/value store of named entries.
///
/// Values are raw bytes at this layer; [`EntryStore::get`] and
/// [`EntryStore::set`] are the text view the ledger normally uses.
///
/// All implementations must satisfy these invariants:
/// - `set_bytes` replaces the whole value; readers never observe a partial write.
/// - The store never interprets values.
/// - Keys are validated with [`validate_key`] before use.
/// - All I/O errors are propagated, never silently ignored.
pub trait EntryStore: Send + Sync {
    /// Read an entry's raw bytes by name.
    ///
    /// Returns `Ok(None)` if the entry does not exist.
    fn get_bytes(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Create or replace an entry with raw bytes.
    fn set_bytes(&self, key: &str, value: &[u8]) -> StoreResult<()>;

    /// Delete an entry. Returns `true` if the entry existed.
    fn remove(&self, key: &str) -> StoreResult<bool>;

    /// Read an entry as UTF-8 text.
    ///
    /// Returns `Ok(None)` if the entry does not exist and
    /// [`StoreError::NotUtf8`] if it exists but is not text.
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        match self.get_bytes(key)? {
            Some(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|_| StoreError::NotUtf8 {
                    key: key.to_string(),
                }),
            None => Ok(None),
        }
    }

    /// Create or replace an entry with text.
    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.set_bytes(key, value.as_bytes())
    }

    /// Check whether an entry exists.
    fn contains(&self, key: &str) -> StoreResult<bool> {
        Ok(self.get_bytes(key)?.is_some())
    }
}

impl<S: EntryStore + ?Sized> EntryStore for &S {
    fn get_bytes(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        (**self).get_bytes(key)
    }

    fn set_bytes(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        (**self).set_bytes(key, value)
    }

    fn remove(&self, key: &str) -> StoreResult<bool> {
        (**self).remove(key)
    }

    fn contains(&self, key: &str) -> StoreResult<bool> {
        (**self).contains(key)
    }
}

/// Check that an entry name is usable by every backend.
///
/// Keys must be non-empty, must not start with `.`, and may only contain
/// ASCII letters, digits, `.`, `_` and `-`. This keeps file-backed entries
/// inside their directory.
pub fn validate_key(key: &str) -> StoreResult<()> {
    let invalid = |reason| {
        Err(StoreError::InvalidKey {
            key: key.to_string(),
            reason,
        })
    };
    if key.is_empty() {
        return invalid("empty");
    }
    if key.starts_with('.') {
        return invalid("leading dot");
    }
    if !key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return invalid("allowed characters are A-Z a-z 0-9 . _ -");
    }
    Ok(())
}
