//! Hashing primitives for the veterinary treatment ledger.
//!
//! Provides the system-wide SHA-256 digest (rendered as lowercase hex) and a
//! hash chain verifier for any sequence of hash-linked entries.
//!
//! SHA-256 comes from the `sha2` crate; nothing here implements a primitive.

pub mod chain;
pub mod digest;

pub use chain::{ChainError, HasBlockHash, HashChainVerifier};
pub use digest::{DigestError, Sha256Digest, DIGEST_HEX_LEN};
