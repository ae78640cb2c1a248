use vtl_crypto::DigestError;
use vtl_store::StoreError;

/// Errors produced by ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("integrity violation at index {index}: {reason}")]
    IntegrityViolation { index: u64, reason: String },

    #[error("ledger has no blocks")]
    EmptyLedger,

    #[error("persisted ledger is unreadable: {reason}")]
    CorruptLedger { reason: String },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl From<DigestError> for LedgerError {
    fn from(e: DigestError) -> Self {
        match e {
            DigestError::Serialization(msg) => LedgerError::Serialization(msg),
        }
    }
}

/// Result alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
