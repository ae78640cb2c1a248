use sha2::{Digest, Sha256};

/// Length of a hex-rendered SHA-256 digest.
pub const DIGEST_HEX_LEN: usize = 64;

/// The ledger's digest function: SHA-256 rendered as lowercase hex.
///
/// No domain tag is mixed in: a block hash is `SHA-256(json)` over the
/// canonical block JSON and nothing else. Existing stored chains depend on it.
pub struct Sha256Digest;

impl Sha256Digest {
    /// Hash raw bytes.
    pub fn hex(data: &[u8]) -> String {
        hex::encode(Sha256::digest(data))
    }

    /// Hash the compact JSON serialization of a value.
    ///
    /// Field order follows the value's `Serialize` impl, so callers that need
    /// a stable digest must serialize a type with a fixed field order.
    pub fn hex_json<T: serde::Serialize>(value: &T) -> Result<String, DigestError> {
        let data =
            serde_json::to_vec(value).map_err(|e| DigestError::Serialization(e.to_string()))?;
        Ok(Self::hex(&data))
    }

    /// Returns `true` if `s` looks like a digest produced by [`Self::hex`].
    pub fn is_well_formed(s: &str) -> bool {
        s.len() == DIGEST_HEX_LEN && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }
}

/// Errors from hashing operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DigestError {
    #[error("serialization error: {0}")]
    Serialization(String),
}
