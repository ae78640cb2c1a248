use tracing::{debug, info, warn};
use vtl_crypto::HashChainVerifier;
use vtl_types::Record;

use crate::block::{Block, BlockData};
use crate::clock::{Clock, SystemClock};
use crate::config::{CorruptPolicy, LedgerConfig};
use crate::error::{LedgerError, LedgerResult};
use crate::persistence::{ChainStore, LoadOutcome};
use crate::validation::{validate_blocks, ValidationReport};

/// How the current chain came to be.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LedgerOrigin {
    /// Read from the store.
    Loaded,
    /// Nothing was stored; a genesis block was created.
    GenesisCreated,
    /// The stored chain was unreadable; it was set aside and a genesis block
    /// was created.
    Recovered,
    /// [`Ledger::reset`] replaced the chain.
    Reset,
}

/// Append-only, hash-linked sequence of treatment blocks.
///
/// A `Ledger` value is always ready: construction loads the persisted chain
/// or creates and persists a genesis block before returning, so the chain is
/// never empty afterwards. The ledger is the only owner of its blocks;
/// callers get shared references for rendering and use [`Ledger::append`]
/// and [`Ledger::reset`] to change it.
///
/// Every successful mutation writes the whole chain through the
/// [`ChainStore`] port before returning. If that write fails, the in-memory
/// chain is restored, so memory and store never disagree.
pub struct Ledger<P: ChainStore, C: Clock = SystemClock> {
    port: P,
    clock: C,
    chain: Vec<Block>,
    origin: LedgerOrigin,
    quarantined: Option<String>,
}

impl<P: ChainStore> Ledger<P, SystemClock> {
    /// Open a ledger on the given port using wall-clock timestamps.
    pub fn open(port: P, config: &LedgerConfig) -> LedgerResult<Self> {
        Self::open_with_clock(port, SystemClock, config)
    }
}

impl<P: ChainStore, C: Clock> Ledger<P, C> {
    /// Open a ledger on the given port and clock.
    pub fn open_with_clock(mut port: P, clock: C, config: &LedgerConfig) -> LedgerResult<Self> {
        let mut quarantined = None;
        let (chain, origin) = match port.load()? {
            LoadOutcome::Loaded(blocks) => {
                info!(blocks = blocks.len(), "ledger loaded");
                (blocks, LedgerOrigin::Loaded)
            }
            LoadOutcome::Absent => (Vec::new(), LedgerOrigin::GenesisCreated),
            LoadOutcome::Corrupt { reason } => match config.on_corrupt {
                CorruptPolicy::Fail => return Err(LedgerError::CorruptLedger { reason }),
                CorruptPolicy::StartFresh => {
                    warn!(%reason, "persisted ledger unreadable; starting a fresh chain");
                    // The genesis save below overwrites the entry, so the copy
                    // must exist first.
                    quarantined = port.quarantine()?;
                    (Vec::new(), LedgerOrigin::Recovered)
                }
            },
        };

        let mut ledger = Self {
            port,
            clock,
            chain,
            origin,
            quarantined,
        };

        if ledger.chain.is_empty() {
            let genesis = Block::genesis(ledger.clock.now_timestamp())?;
            ledger.port.save(std::slice::from_ref(&genesis))?;
            info!(hash = %genesis.short_hash(), "genesis block created");
            ledger.chain.push(genesis);
        }

        Ok(ledger)
    }

    /// The tip of the chain.
    pub fn latest(&self) -> LedgerResult<&Block> {
        self.chain.last().ok_or(LedgerError::EmptyLedger)
    }

    /// Append a record as a new block and persist the chain.
    pub fn append(&mut self, record: Record) -> LedgerResult<&Block> {
        let tip = self.latest()?;
        let index = tip
            .index()
            .checked_add(1)
            .ok_or_else(|| LedgerError::IntegrityViolation {
                index: tip.index(),
                reason: "index space exhausted".into(),
            })?;
        let previous_hash = tip.hash().to_string();
        let candidate = Block::new(
            index,
            self.clock.now_timestamp(),
            BlockData::Record(record),
            previous_hash,
            0,
        )?;
        self.append_block(candidate)
    }

    /// Append a pre-built block after checking it against the tip.
    ///
    /// The candidate must link to the tip's hash, carry the next index, and
    /// hash to its own stored hash. On any failure the ledger is unchanged.
    pub fn append_block(&mut self, candidate: Block) -> LedgerResult<&Block> {
        let tip = self.latest()?;
        if let Err(reason) = check_new_block(&candidate, tip) {
            return Err(LedgerError::IntegrityViolation {
                index: candidate.index(),
                reason: reason.into(),
            });
        }

        self.chain.push(candidate);
        if let Err(e) = self.port.save(&self.chain) {
            self.chain.pop();
            return Err(e);
        }

        let tip = self.latest()?;
        debug!(index = tip.index(), hash = %tip.short_hash(), "block appended");
        Ok(tip)
    }

    /// The append-validity predicate.
    pub fn is_new_block_valid(candidate: &Block, tip: &Block) -> bool {
        check_new_block(candidate, tip).is_ok()
    }

    /// Whole-chain pass/fail integrity check. Never fails.
    ///
    /// Every block's stored hash must match its fields, and every block
    /// after the first must link to its predecessor's stored hash. Reads
    /// only the in-memory chain.
    pub fn validate_chain(&self) -> bool {
        HashChainVerifier::is_valid(&self.chain)
    }

    /// Every violation in the chain, with positions.
    pub fn validation_report(&self) -> ValidationReport {
        validate_blocks(&self.chain)
    }

    /// Discard the chain and start over from a new genesis block.
    ///
    /// Destructive with no undo. The old chain stays in place if the new
    /// genesis cannot be persisted.
    pub fn reset(&mut self) -> LedgerResult<&Block> {
        let genesis = Block::genesis(self.clock.now_timestamp())?;
        let fresh = vec![genesis];
        self.port.save(&fresh)?;
        let discarded = std::mem::replace(&mut self.chain, fresh);
        self.origin = LedgerOrigin::Reset;
        info!(discarded = discarded.len(), "ledger reset");
        self.latest()
    }

    pub fn origin(&self) -> LedgerOrigin {
        self.origin
    }

    /// Where the unreadable chain was copied when this ledger was opened
    /// with [`LedgerOrigin::Recovered`].
    pub fn quarantined(&self) -> Option<&str> {
        self.quarantined.as_deref()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.chain
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Block> {
        self.chain.iter()
    }

    /// Block at a position, which equals its index in a valid chain.
    pub fn get(&self, position: usize) -> Option<&Block> {
        self.chain.get(position)
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Always `false` for a constructed ledger.
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn port(&self) -> &P {
        &self.port
    }
}

impl<'a, P: ChainStore, C: Clock> IntoIterator for &'a Ledger<P, C> {
    type Item = &'a Block;
    type IntoIter = std::slice::Iter<'a, Block>;

    fn into_iter(self) -> Self::IntoIter {
        self.chain.iter()
    }
}

fn check_new_block(candidate: &Block, tip: &Block) -> Result<(), &'static str> {
    if candidate.previous_hash() != tip.hash() {
        return Err("previous hash does not match the tip");
    }
    if !candidate.is_self_consistent() {
        return Err("hash does not match block contents");
    }
    if tip.index().checked_add(1) != Some(candidate.index()) {
        return Err("index does not follow the tip");
    }
    Ok(())
}
