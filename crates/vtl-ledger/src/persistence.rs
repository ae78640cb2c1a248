use tracing::{debug, warn};
use vtl_store::{EntryStore, StoreError};

use crate::block::Block;
use crate::config::LedgerConfig;
use crate::error::{LedgerError, LedgerResult};

/// Suffix of the entry an unreadable chain is copied to.
pub const CORRUPT_SUFFIX: &str = ".corrupt";

/// How many `<key>.corrupt[.<n>]` slots are tried before giving up.
pub const MAX_QUARANTINE_SLOTS: usize = 1000;

/// Result of reading the persisted chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Nothing stored, or an empty sequence.
    Absent,
    /// A sequence of blocks, hashes taken as stored.
    Loaded(Vec<Block>),
    /// Something is stored but it is not a sequence of blocks.
    Corrupt { reason: String },
}

/// Persistence port consumed by the ledger.
///
/// The whole chain is written on every mutation; there is no incremental
/// format. Implementations must replace the stored sequence atomically.
pub trait ChainStore {
    fn load(&self) -> LedgerResult<LoadOutcome>;

    fn save(&mut self, blocks: &[Block]) -> LedgerResult<()>;

    /// Copy an unreadable stored value to a fresh location, never replacing
    /// an earlier copy. Returns where it went, or `None` if nothing is stored.
    fn quarantine(&mut self) -> LedgerResult<Option<String>>;
}

/// Chain persistence as a JSON array under one named entry.
///
/// ```text
/// simple_chain_qr = [{"index":0,"timestamp":"...","data":{"genesis":true},
///                     "previousHash":"0","nonce":0,"hash":"..."}, ...]
/// ```
#[derive(Debug)]
pub struct EntryChainStore<S: EntryStore> {
    store: S,
    key: String,
}

impl<S: EntryStore> EntryChainStore<S> {
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn from_config(store: S, config: &LedgerConfig) -> Self {
        Self::new(store, config.storage_key.clone())
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Name of the `attempt`-th quarantine slot: `<key>.corrupt`, then
    /// `<key>.corrupt.1`, `<key>.corrupt.2`, ...
    pub fn quarantine_key(&self, attempt: usize) -> String {
        match attempt {
            0 => format!("{}{CORRUPT_SUFFIX}", self.key),
            n => format!("{}{CORRUPT_SUFFIX}.{n}", self.key),
        }
    }

    fn free_quarantine_key(&self) -> LedgerResult<String> {
        for attempt in 0..MAX_QUARANTINE_SLOTS {
            let candidate = self.quarantine_key(attempt);
            if !self.store.contains(&candidate)? {
                return Ok(candidate);
            }
        }
        Err(LedgerError::CorruptLedger {
            reason: format!(
                "all {MAX_QUARANTINE_SLOTS} quarantine slots for {:?} are taken",
                self.key
            ),
        })
    }
}

impl<S: EntryStore> ChainStore for EntryChainStore<S> {
    fn load(&self) -> LedgerResult<LoadOutcome> {
        let raw = match self.store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Ok(LoadOutcome::Absent),
            Err(StoreError::NotUtf8 { .. }) => {
                return Ok(LoadOutcome::Corrupt {
                    reason: "stored value is not UTF-8 text".into(),
                })
            }
            Err(e) => return Err(e.into()),
        };

        if raw.trim().is_empty() {
            return Ok(LoadOutcome::Absent);
        }

        match serde_json::from_str::<Vec<Block>>(&raw) {
            Ok(blocks) if blocks.is_empty() => Ok(LoadOutcome::Absent),
            Ok(blocks) => {
                debug!(key = %self.key, blocks = blocks.len(), "chain loaded");
                Ok(LoadOutcome::Loaded(blocks))
            }
            Err(e) => Ok(LoadOutcome::Corrupt {
                reason: e.to_string(),
            }),
        }
    }

    fn save(&mut self, blocks: &[Block]) -> LedgerResult<()> {
        let json =
            serde_json::to_string(blocks).map_err(|e| LedgerError::Serialization(e.to_string()))?;
        self.store.set(&self.key, &json)?;
        debug!(key = %self.key, blocks = blocks.len(), bytes = json.len(), "chain saved");
        Ok(())
    }

    fn quarantine(&mut self) -> LedgerResult<Option<String>> {
        let Some(raw) = self.store.get_bytes(&self.key)? else {
            return Ok(None);
        };
        let target = self.free_quarantine_key()?;
        self.store.set_bytes(&target, &raw)?;
        warn!(
            key = %self.key,
            moved_to = %target,
            bytes = raw.len(),
            "unreadable chain set aside"
        );
        Ok(Some(target))
    }
}
