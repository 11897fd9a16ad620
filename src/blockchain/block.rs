use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::payload::Payload;

/// Errors that can occur while building a block
#[derive(Debug, Error)]
pub enum BlockError {
    #[error("No position follows {position}")]
    PositionOverflow { position: u64 },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Position of the block that follows one at `position`
pub fn next_position(position: u64) -> Option<u64> {
    position.checked_add(1)
}

/// Represents a block in the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block<P> {
    /// Position of the block in the chain (genesis is 0)
    pub position: u64,

    /// Data recorded by this block
    pub payload: P,

    /// Creation instant, RFC 3339 in UTC
    pub timestamp: String,

    /// Hash of this block
    pub hash: String,

    /// Hash of the previous block (empty for genesis)
    pub prev_hash: String,
}

impl<P: Payload> Block<P> {
    /// Creates the block that follows `prev_block`
    ///
    /// # Arguments
    ///
    /// * `prev_block` - The current tail of the chain
    /// * `payload` - The data to record
    ///
    /// # Returns
    ///
    /// A new Block linked to `prev_block`
    pub fn new(prev_block: &Block<P>, payload: P) -> Result<Self, BlockError> {
        let position = next_position(prev_block.position).ok_or(BlockError::PositionOverflow {
            position: prev_block.position,
        })?;

        Self::build(position, payload, prev_block.hash.clone())
    }

    /// Creates the genesis block
    ///
    /// The genesis block sits at position 0, has no previous hash and carries
    /// the payload's genesis marker.
    pub fn genesis() -> Result<Self, BlockError> {
        Self::build(0, P::genesis(), String::new())
    }

    fn build(position: u64, payload: P, prev_hash: String) -> Result<Self, BlockError> {
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true);
        let hash = digest(position, &timestamp, &payload.canonical_bytes()?, &prev_hash);

        Ok(Block {
            position,
            payload,
            timestamp,
            hash,
            prev_hash,
        })
    }

    /// Recomputes the hash of the block from its current fields
    ///
    /// # Returns
    ///
    /// The SHA-256 hash of the block as a hexadecimal string
    pub fn calculate_hash(&self) -> Result<String, serde_json::Error> {
        Ok(digest(
            self.position,
            &self.timestamp,
            &self.payload.canonical_bytes()?,
            &self.prev_hash,
        ))
    }

    /// Whether this block has the shape of a genesis block
    pub fn is_genesis(&self) -> bool {
        self.position == 0 && self.prev_hash.is_empty() && self.payload.is_genesis()
    }
}

/// Computes the hash of a block's content
///
/// Fields are hashed in the order position, timestamp, payload, previous
/// hash. The position is written as 8 big-endian bytes and every other field
/// is prefixed with its length, so distinct field tuples never produce the
/// same byte stream.
pub fn digest(position: u64, timestamp: &str, payload: &[u8], prev_hash: &str) -> String {
    let mut hasher = Sha256::new();

    hasher.update(position.to_be_bytes());
    update_field(&mut hasher, timestamp.as_bytes());
    update_field(&mut hasher, payload);
    update_field(&mut hasher, prev_hash.as_bytes());

    hex::encode(hasher.finalize())
}

fn update_field(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_be_bytes());
    hasher.update(bytes);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::Transaction;

    fn allergy_update() -> Transaction {
        Transaction {
            user_id: "u1".to_string(),
            updated_key: "allergy".to_string(),
            updated_value: "penicillin".to_string(),
            ..Transaction::default()
        }
    }

    #[test]
    fn test_genesis_block() {
        let genesis = Block::<Transaction>::genesis().unwrap();

        assert_eq!(genesis.position, 0);
        assert_eq!(genesis.prev_hash, "");
        assert!(genesis.payload.is_genesis);
        assert!(genesis.is_genesis());
        assert_eq!(genesis.hash.len(), 64);
    }

    #[test]
    fn test_new_block() {
        let genesis = Block::genesis().unwrap();
        let block = Block::new(&genesis, allergy_update()).unwrap();

        assert_eq!(block.position, 1);
        assert_eq!(block.prev_hash, genesis.hash);
        assert_eq!(block.payload.updated_value, "penicillin");
        assert!(!block.is_genesis());
    }

    #[test]
    fn test_calculate_hash() {
        let genesis = Block::genesis().unwrap();
        let block = Block::new(&genesis, allergy_update()).unwrap();

        let hash = block.calculate_hash().unwrap();
        assert_eq!(hash, block.hash);
        assert_eq!(hash.len(), 64); // SHA-256 hash is 64 characters in hex
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_new_block_at_last_position() {
        let mut tail = Block::genesis().unwrap();
        tail.position = u64::MAX;

        match Block::new(&tail, allergy_update()) {
            Err(BlockError::PositionOverflow { position }) => assert_eq!(position, u64::MAX),
            other => panic!("expected position overflow, got {:?}", other),
        }

        assert_eq!(next_position(u64::MAX - 1), Some(u64::MAX));
        assert_eq!(next_position(u64::MAX), None);
    }

    #[test]
    fn test_digest_is_unambiguous() {
        // Naive concatenation would render both as "123"
        let a = digest(1, "23", b"{}", "");
        let b = digest(12, "3", b"{}", "");
        assert_ne!(a, b);

        let c = digest(1, "ab", b"c", "");
        let d = digest(1, "a", b"bc", "");
        assert_ne!(c, d);
    }

    #[test]
    fn test_digest_is_deterministic() {
        let a = digest(7, "2024-01-01T00:00:00Z", b"payload", "prev");
        let b = digest(7, "2024-01-01T00:00:00Z", b"payload", "prev");
        assert_eq!(a, b);
    }
}
