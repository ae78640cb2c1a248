use serde::{Deserialize, Serialize};

/// Default name of the persisted ledger entry.
pub const DEFAULT_STORAGE_KEY: &str = "simple_chain_qr";

/// What to do when the persisted ledger exists but cannot be read.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CorruptPolicy {
    /// Set the unreadable value aside under `<key>.corrupt`, log a warning,
    /// and start a fresh chain.
    #[default]
    StartFresh,
    /// Refuse to open; the store is left untouched.
    Fail,
}

/// Ledger configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Name of the entry holding the persisted chain.
    pub storage_key: String,
    pub on_corrupt: CorruptPolicy,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            on_corrupt: CorruptPolicy::default(),
        }
    }
}
