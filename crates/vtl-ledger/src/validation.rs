use serde::Serialize;
use vtl_crypto::Sha256Digest;

use crate::block::{Block, GENESIS_INDEX, GENESIS_PREVIOUS_HASH};

/// Result of a full diagnostic pass over a chain.
///
/// `Ledger::validate_chain` answers pass/fail only. The report names every
/// violation found, which is what an auditor needs to locate an edit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub block_count: usize,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    /// Pass/fail on hash and link checks. Agrees with `Ledger::validate_chain`.
    pub fn is_valid(&self) -> bool {
        !self.violations.iter().any(|v| v.kind.breaks_integrity())
    }

    /// Returns `true` if no violation of any kind was found.
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    /// Position of the first violation, if any.
    pub fn first_violation(&self) -> Option<&Violation> {
        self.violations.first()
    }
}

/// A specific problem found at one position of the chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Position in the sequence (not the block's stored index).
    pub position: usize,
    pub kind: ViolationKind,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// Stored hash differs from the hash of the block's fields.
    HashMismatch,
    /// `previousHash` differs from the predecessor's stored hash.
    BrokenLink,
    /// Index is not the predecessor's index plus one.
    IndexGap,
    /// First block lacks index 0 or the `"0"` sentinel.
    GenesisMalformed,
    /// Stored hash is not 64 lowercase hex characters.
    MalformedHash,
}

impl ViolationKind {
    /// Hash and link violations decide the pass/fail verdict; index and
    /// genesis findings are reported alongside it.
    pub fn breaks_integrity(self) -> bool {
        matches!(self, ViolationKind::HashMismatch | ViolationKind::BrokenLink)
    }
}

/// Check every block and collect all violations.
pub fn validate_blocks(blocks: &[Block]) -> ValidationReport {
    let mut violations = Vec::new();

    for (position, block) in blocks.iter().enumerate() {
        if position == 0 {
            if block.index != GENESIS_INDEX || block.previous_hash != GENESIS_PREVIOUS_HASH {
                violations.push(Violation {
                    position,
                    kind: ViolationKind::GenesisMalformed,
                    description: format!(
                        "expected index 0 and previous hash \"0\", found index {} and {:?}",
                        block.index, block.previous_hash
                    ),
                });
            }
        } else {
            let prev = &blocks[position - 1];
            if block.previous_hash != prev.hash {
                violations.push(Violation {
                    position,
                    kind: ViolationKind::BrokenLink,
                    description: "previous hash does not match predecessor".into(),
                });
            }
            if prev.index.checked_add(1) != Some(block.index) {
                violations.push(Violation {
                    position,
                    kind: ViolationKind::IndexGap,
                    description: format!(
                        "expected index {}, found {}",
                        prev.index.saturating_add(1),
                        block.index
                    ),
                });
            }
        }

        if !block.is_self_consistent() {
            violations.push(Violation {
                position,
                kind: ViolationKind::HashMismatch,
                description: "stored hash does not match block contents".into(),
            });
        }
        if !Sha256Digest::is_well_formed(&block.hash) {
            violations.push(Violation {
                position,
                kind: ViolationKind::MalformedHash,
                description: format!("stored hash {:?} is not a SHA-256 hex digest", block.hash),
            });
        }
    }

    ValidationReport {
        block_count: blocks.len(),
        violations,
    }
}
