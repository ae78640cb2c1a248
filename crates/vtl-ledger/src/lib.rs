//! Ledger integrity engine for the veterinary treatment ledger (VTL).
//!
//! Treatment events are recorded as an append-only chain of hash-linked
//! blocks kept in local storage, so that an auditor can later detect any
//! retroactive edit. This crate provides:
//! - [`Block`]: immutable, hash-addressed entry with its canonical hash input
//! - [`Ledger`]: append, whole-chain validation, reset, load/save
//! - [`ChainStore`]: persistence port, with [`EntryChainStore`] over any
//!   named-entry store
//! - [`Clock`]: timestamp port, with a wall clock and a deterministic one
//! - [`ValidationReport`]: per-position diagnostics for auditors
//!
//! The ledger assumes a single trusted writer at a time; there is no
//! locking, consensus, or signing.

pub mod block;
pub mod clock;
pub mod config;
pub mod error;
pub mod ledger;
pub mod persistence;
pub mod validation;

pub use block::{Block, BlockData, GenesisMarker, GENESIS_INDEX, GENESIS_PREVIOUS_HASH};
pub use clock::{format_timestamp, Clock, FixedClock, SystemClock};
pub use config::{CorruptPolicy, LedgerConfig, DEFAULT_STORAGE_KEY};
pub use error::{LedgerError, LedgerResult};
pub use ledger::{Ledger, LedgerOrigin};
pub use persistence::{
    ChainStore, EntryChainStore, LoadOutcome, CORRUPT_SUFFIX, MAX_QUARANTINE_SLOTS,
};
pub use validation::{validate_blocks, ValidationReport, Violation, ViolationKind};
