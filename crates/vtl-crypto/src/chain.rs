use crate::digest::DigestError;

/// Trait for entries that participate in a hash chain.
pub trait HasBlockHash {
    /// The entry's stored hash.
    fn block_hash(&self) -> &str;
    /// The stored hash of the entry it links to.
    fn previous_hash(&self) -> &str;
    /// The hash recomputed from the entry's own fields.
    fn recompute_hash(&self) -> Result<String, DigestError>;
}

/// Hash chain integrity verifier.
///
/// Verifies that a sequence of entries forms a valid hash chain: every
/// entry's stored hash matches the hash of its own fields, and each entry
/// after the first links to the stored hash of its predecessor. The first
/// entry's link target is a sentinel and is not checked here.
pub struct HashChainVerifier;

impl HashChainVerifier {
    /// Verify a chain, returning the first failing position.
    ///
    /// Checks:
    /// 1. The first entry's hash is correct for its fields
    /// 2. Each subsequent entry's previous hash equals the predecessor's hash
    /// 3. Each subsequent entry's hash is correct for its fields
    pub fn verify_chain(entries: &[impl HasBlockHash]) -> Result<(), ChainError> {
        let Some(first) = entries.first() else {
            return Ok(());
        };

        if !Self::hash_matches(first) {
            return Err(ChainError::HashMismatch { index: 0 });
        }

        for (i, pair) in entries.windows(2).enumerate() {
            let (prev, curr) = (&pair[0], &pair[1]);
            if curr.previous_hash() != prev.block_hash() {
                return Err(ChainError::BrokenLink { index: i + 1 });
            }
            if !Self::hash_matches(curr) {
                return Err(ChainError::HashMismatch { index: i + 1 });
            }
        }

        Ok(())
    }

    /// Returns `true` if the entry's stored hash matches its fields.
    pub fn hash_matches(entry: &impl HasBlockHash) -> bool {
        entry
            .recompute_hash()
            .is_ok_and(|computed| computed == entry.block_hash())
    }

    /// Verify a chain and collapse the result to pass/fail.
    pub fn is_valid(entries: &[impl HasBlockHash]) -> bool {
        Self::verify_chain(entries).is_ok()
    }
}

/// Errors from chain verification.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("broken link at position {index}: previous hash does not match")]
    BrokenLink { index: usize },

    #[error("hash mismatch at position {index}: computed hash differs from stored")]
    HashMismatch { index: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::Sha256Digest;

    struct TestEntry {
        hash: String,
        prev: String,
        payload: String,
    }

    impl HasBlockHash for TestEntry {
        fn block_hash(&self) -> &str {
            &self.hash
        }
        fn previous_hash(&self) -> &str {
            &self.prev
        }
        fn recompute_hash(&self) -> Result<String, DigestError> {
            Ok(Sha256Digest::hex(
                format!("{}{}", self.prev, self.payload).as_bytes(),
            ))
        }
    }

    fn build_chain(count: usize) -> Vec<TestEntry> {
        let mut chain: Vec<TestEntry> = Vec::new();
        let mut prev = "0".to_string();
        for i in 0..count {
            let mut entry = TestEntry {
                hash: String::new(),
                prev: prev.clone(),
                payload: format!("entry-{i}"),
            };
            entry.hash = entry.recompute_hash().unwrap();
            prev = entry.hash.clone();
            chain.push(entry);
        }
        chain
    }

    #[test]
    fn empty_chain_is_valid() {
        let chain: Vec<TestEntry> = vec![];
        assert!(HashChainVerifier::verify_chain(&chain).is_ok());
    }

    #[test]
    fn single_entry_chain() {
        assert!(HashChainVerifier::is_valid(&build_chain(1)));
    }

    #[test]
    fn multi_entry_chain() {
        assert!(HashChainVerifier::is_valid(&build_chain(10)));
    }

    #[test]
    fn broken_link_detected() {
        let mut chain = build_chain(3);
        chain[2].prev = "f".repeat(64);
        assert_eq!(
            HashChainVerifier::verify_chain(&chain),
            Err(ChainError::BrokenLink { index: 2 })
        );
    }

    #[test]
    fn tampered_payload_detected() {
        let mut chain = build_chain(3);
        chain[1].payload = "tampered".into();
        assert_eq!(
            HashChainVerifier::verify_chain(&chain),
            Err(ChainError::HashMismatch { index: 1 })
        );
    }

    #[test]
    fn tampered_first_entry_detected() {
        let mut chain = build_chain(3);
        chain[0].payload = "tampered".into();
        assert_eq!(
            HashChainVerifier::verify_chain(&chain),
            Err(ChainError::HashMismatch { index: 0 })
        );
    }

    #[test]
    fn rehashed_entry_breaks_successor_link() {
        let mut chain = build_chain(3);
        chain[1].payload = "tampered".into();
        chain[1].hash = chain[1].recompute_hash().unwrap();
        assert_eq!(
            HashChainVerifier::verify_chain(&chain),
            Err(ChainError::BrokenLink { index: 2 })
        );
    }
}
