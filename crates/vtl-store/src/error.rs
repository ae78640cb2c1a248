/// Errors from entry store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The entry name cannot be used as a storage key.
    #[error("invalid entry key {key:?}: {reason}")]
    InvalidKey { key: String, reason: &'static str },

    /// The stored bytes are not valid UTF-8 text.
    #[error("entry {key:?} is not valid UTF-8")]
    NotUtf8 { key: String },

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An atomic replace could not be completed.
    #[error("failed to persist entry {key:?}: {source}")]
    Persist {
        key: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
