use serde::{Deserialize, Serialize};
use vtl_crypto::{DigestError, HasBlockHash, Sha256Digest};
use vtl_types::Record;

use crate::error::LedgerResult;

/// `previousHash` of the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// Index of the genesis block.
pub const GENESIS_INDEX: u64 = 0;

/// The `{"genesis": true}` marker stored as the genesis block's data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenesisMarker {
    pub genesis: bool,
}

impl Default for GenesisMarker {
    fn default() -> Self {
        Self { genesis: true }
    }
}

/// Payload of a block: the genesis marker or a treatment record.
///
/// Untagged on the wire. A stored object is read as the genesis marker only
/// if it is exactly `{"genesis": <bool>}`; anything else must be a record of
/// string fields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockData {
    Genesis(GenesisMarker),
    Record(Record),
}

impl BlockData {
    pub fn genesis() -> Self {
        BlockData::Genesis(GenesisMarker::default())
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            BlockData::Record(r) => Some(r),
            BlockData::Genesis(_) => None,
        }
    }
}

impl From<Record> for BlockData {
    fn from(record: Record) -> Self {
        BlockData::Record(record)
    }
}

/// One hash-addressed entry of the ledger.
///
/// The hash is computed once, in [`Block::new`], and is never recomputed
/// implicitly: a block read back from storage keeps whatever hash was stored.
/// Call [`Block::compute_hash`] to recompute and compare.
///
/// Canonical hash input is the compact JSON of
/// `{"index","timestamp","data","previousHash","nonce"}` in exactly that key
/// order, hashed with SHA-256 and rendered as lowercase hex. The persisted
/// form is the same object followed by `"hash"`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub(crate) index: u64,
    pub(crate) timestamp: String,
    pub(crate) data: BlockData,
    pub(crate) previous_hash: String,
    pub(crate) nonce: u64,
    pub(crate) hash: String,
}

/// Borrowed view of the hashed fields, serialized in canonical order.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HashInput<'a> {
    index: u64,
    timestamp: &'a str,
    data: &'a BlockData,
    previous_hash: &'a str,
    nonce: u64,
}

impl Block {
    /// Construct a block and fix its hash.
    pub fn new(
        index: u64,
        timestamp: impl Into<String>,
        data: BlockData,
        previous_hash: impl Into<String>,
        nonce: u64,
    ) -> LedgerResult<Self> {
        let mut block = Self {
            index,
            timestamp: timestamp.into(),
            data,
            previous_hash: previous_hash.into(),
            nonce,
            hash: String::new(),
        };
        block.hash = block.compute_hash()?;
        Ok(block)
    }

    /// Construct the genesis block for the given timestamp.
    pub fn genesis(timestamp: impl Into<String>) -> LedgerResult<Self> {
        Self::new(
            GENESIS_INDEX,
            timestamp,
            BlockData::genesis(),
            GENESIS_PREVIOUS_HASH,
            0,
        )
    }

    /// The exact bytes the block hash is computed over.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, DigestError> {
        serde_json::to_vec(&self.hash_input())
            .map_err(|e| DigestError::Serialization(e.to_string()))
    }

    /// Recompute the hash from the block's current fields. Pure.
    pub fn compute_hash(&self) -> Result<String, DigestError> {
        Sha256Digest::hex_json(&self.hash_input())
    }

    /// Returns `true` if the stored hash matches the block's fields.
    pub fn is_self_consistent(&self) -> bool {
        self.compute_hash().is_ok_and(|h| h == self.hash)
    }

    fn hash_input(&self) -> HashInput<'_> {
        HashInput {
            index: self.index,
            timestamp: &self.timestamp,
            data: &self.data,
            previous_hash: &self.previous_hash,
            nonce: self.nonce,
        }
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn data(&self) -> &BlockData {
        &self.data
    }

    /// The treatment record, or `None` for the genesis block.
    pub fn record(&self) -> Option<&Record> {
        self.data.as_record()
    }

    pub fn previous_hash(&self) -> &str {
        &self.previous_hash
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// First 12 hex characters of the hash, for display.
    pub fn short_hash(&self) -> &str {
        self.hash.get(..12).unwrap_or(&self.hash)
    }

    pub fn is_genesis(&self) -> bool {
        self.index == GENESIS_INDEX && self.previous_hash == GENESIS_PREVIOUS_HASH
    }
}

impl HasBlockHash for Block {
    fn block_hash(&self) -> &str {
        &self.hash
    }

    fn previous_hash(&self) -> &str {
        &self.previous_hash
    }

    fn recompute_hash(&self) -> Result<String, DigestError> {
        self.compute_hash()
    }
}
