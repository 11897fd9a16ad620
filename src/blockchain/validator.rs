use thiserror::Error;

use super::block::{next_position, Block};
use super::payload::Payload;

/// Reasons a block fails validation against its predecessor
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Linkage mismatch: expected previous hash {expected}, found {found}")]
    LinkageMismatch { expected: String, found: String },

    #[error("Hash mismatch at position {position}")]
    HashMismatch { position: u64 },

    #[error("Sequence gap: expected position {expected}, found {found}")]
    SequenceGap { expected: u64, found: u64 },

    #[error("No position follows {position}")]
    PositionOverflow { position: u64 },

    #[error("Malformed genesis block at position {position}")]
    MalformedGenesis { position: u64 },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Validates a candidate block against its predecessor
///
/// Checks run in order and stop at the first failure: the link to the
/// predecessor's hash, the block's own hash, then the position increment.
pub fn validate_block<P: Payload>(
    candidate: &Block<P>,
    predecessor: &Block<P>,
) -> Result<(), ValidationError> {
    if candidate.prev_hash != predecessor.hash {
        return Err(ValidationError::LinkageMismatch {
            expected: predecessor.hash.clone(),
            found: candidate.prev_hash.clone(),
        });
    }

    if candidate.calculate_hash()? != candidate.hash {
        return Err(ValidationError::HashMismatch {
            position: candidate.position,
        });
    }

    let expected = next_position(predecessor.position).ok_or(ValidationError::PositionOverflow {
        position: predecessor.position,
    })?;
    if candidate.position != expected {
        return Err(ValidationError::SequenceGap {
            expected,
            found: candidate.position,
        });
    }

    Ok(())
}

/// Boolean form of [`validate_block`]
pub fn is_valid<P: Payload>(candidate: &Block<P>, predecessor: &Block<P>) -> bool {
    validate_block(candidate, predecessor).is_ok()
}

/// Validates the genesis block on its own
pub fn validate_genesis<P: Payload>(genesis: &Block<P>) -> Result<(), ValidationError> {
    if !genesis.is_genesis() {
        return Err(ValidationError::MalformedGenesis {
            position: genesis.position,
        });
    }

    if genesis.calculate_hash()? != genesis.hash {
        return Err(ValidationError::HashMismatch { position: 0 });
    }

    Ok(())
}

/// Validates a whole chain, genesis first
///
/// An empty slice is accepted here; the ledger never holds one.
pub fn validate_chain<P: Payload>(blocks: &[Block<P>]) -> Result<(), ValidationError> {
    let Some(genesis) = blocks.first() else {
        return Ok(());
    };

    validate_genesis(genesis)?;

    for pair in blocks.windows(2) {
        validate_block(&pair[1], &pair[0])?;
    }

    Ok(())
}
