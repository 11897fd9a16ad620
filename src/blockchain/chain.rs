use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::{error, info, warn};
use thiserror::Error;

use super::auth::{AllowAll, AuthorizationCheck};
use super::block::{Block, BlockError};
use super::payload::Payload;
use super::validator::{self, ValidationError};

/// Errors that can occur during ledger operations
#[derive(Debug, Error)]
pub enum BlockchainError {
    #[error("Invalid block: {0}")]
    Validation(#[from] ValidationError),

    #[error("Ledger has no blocks")]
    EmptyChain,

    #[error("Role not authorized: {0:?}")]
    Unauthorized(String),

    #[error("Could not build block: {0}")]
    Block(#[from] BlockError),
}

impl BlockchainError {
    /// Whether the ledger instance can no longer be trusted
    pub fn is_fatal(&self) -> bool {
        matches!(self, BlockchainError::EmptyChain)
    }
}

/// Represents the ledger
///
/// Cloning is cheap and every clone shares the same chain.
pub struct Blockchain<P> {
    /// The chain of blocks
    chain: Arc<RwLock<Vec<Block<P>>>>,

    /// Role check consulted by `submit`
    authorization: Arc<dyn AuthorizationCheck>,
}

impl<P> Clone for Blockchain<P> {
    fn clone(&self) -> Self {
        Blockchain {
            chain: Arc::clone(&self.chain),
            authorization: Arc::clone(&self.authorization),
        }
    }
}

impl<P> fmt::Debug for Blockchain<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let len = self.chain.read().unwrap_or_else(PoisonError::into_inner).len();
        f.debug_struct("Blockchain").field("len", &len).finish()
    }
}

impl<P: Payload> Blockchain<P> {
    /// Creates a new ledger with a genesis block and no role restrictions
    pub fn new() -> Result<Self, BlockchainError> {
        Self::with_authorization(AllowAll)
    }

    /// Creates a new ledger with a genesis block and the given role check
    ///
    /// # Arguments
    ///
    /// * `authorization` - The check consulted before each `submit`
    ///
    /// # Returns
    ///
    /// A new Blockchain instance
    pub fn with_authorization<A>(authorization: A) -> Result<Self, BlockchainError>
    where
        A: AuthorizationCheck + 'static,
    {
        Self::with_shared_authorization(Arc::new(authorization))
    }

    /// Creates a new ledger with a genesis block and an already shared role check
    pub fn with_shared_authorization(
        authorization: Arc<dyn AuthorizationCheck>,
    ) -> Result<Self, BlockchainError> {
        let genesis = Block::genesis()?;
        info!("Created genesis block {}", genesis.hash);

        Ok(Blockchain {
            chain: Arc::new(RwLock::new(vec![genesis])),
            authorization,
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Block<P>>> {
        self.chain.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Block<P>>> {
        self.chain.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends a payload as a new block
    ///
    /// The tail is read, the candidate built and validated, and the chain
    /// extended while holding the write lock, so concurrent appends are
    /// applied one after another.
    ///
    /// # Returns
    ///
    /// The appended block, or the reason it was rejected
    pub fn append(&self, payload: P) -> Result<Block<P>, BlockchainError> {
        let mut chain = self.write();

        let Some(last_block) = chain.last() else {
            error!("Append attempted on a ledger with no blocks");
            return Err(BlockchainError::EmptyChain);
        };

        let block = Block::new(last_block, payload)?;

        if let Err(err) = validator::validate_block(&block, last_block) {
            warn!("Rejected block at position {}: {}", block.position, err);
            return Err(err.into());
        }

        info!("Appended block {} with hash {}", block.position, block.hash);
        chain.push(block.clone());

        Ok(block)
    }

    /// Appends a payload on behalf of `role`
    ///
    /// The configured authorization check runs first; a refused role leaves
    /// the ledger unchanged.
    pub fn submit(&self, role: &str, payload: P) -> Result<Block<P>, BlockchainError> {
        if !self.authorization.is_authorized(role) {
            warn!("Refused append for role {:?}", role);
            return Err(BlockchainError::Unauthorized(role.to_string()));
        }

        self.append(payload)
    }

    /// Gets a copy of the entire chain
    ///
    /// # Returns
    ///
    /// A vector of all blocks in the chain, genesis first
    pub fn snapshot(&self) -> Vec<Block<P>> {
        self.read().clone()
    }

    /// Gets the last block in the chain
    pub fn last_block(&self) -> Option<Block<P>> {
        self.read().last().cloned()
    }

    /// Number of blocks, genesis included
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Validates the whole chain
    pub fn validate(&self) -> Result<(), BlockchainError> {
        let chain = self.read();

        if chain.is_empty() {
            return Err(BlockchainError::EmptyChain);
        }

        validator::validate_chain(&chain)?;
        Ok(())
    }

    /// Validates the blockchain
    ///
    /// # Returns
    ///
    /// true if the blockchain is valid, false otherwise
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::auth::RoleAllowList;
    use crate::blockchain::Transaction;
    use std::thread;

    fn update(user_id: &str, key: &str, value: &str) -> Transaction {
        Transaction {
            user_id: user_id.to_string(),
            updated_key: key.to_string(),
            updated_value: value.to_string(),
            ..Transaction::default()
        }
    }

    #[test]
    fn test_new_blockchain() {
        let blockchain = Blockchain::<Transaction>::new().unwrap();
        let chain = blockchain.snapshot();

        assert_eq!(chain.len(), 1);
        assert_eq!(chain[0].position, 0);
        assert_eq!(chain[0].prev_hash, "");
        assert!(chain[0].payload.is_genesis);
        assert!(blockchain.is_valid());
    }

    #[test]
    fn test_append() {
        let blockchain = Blockchain::new().unwrap();

        let block = blockchain
            .append(update("u1", "allergy", "penicillin"))
            .unwrap();

        let chain = blockchain.snapshot();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[1], block);
        assert_eq!(chain[1].position, 1);
        assert_eq!(chain[1].prev_hash, chain[0].hash);
        assert!(validator::is_valid(&chain[1], &chain[0]));
    }

    #[test]
    fn test_chain_linearity() {
        let blockchain = Blockchain::new().unwrap();

        for i in 0..10 {
            blockchain
                .append(update("u1", "visit", &i.to_string()))
                .unwrap();
        }

        let chain = blockchain.snapshot();
        assert_eq!(chain.len(), 11);

        for pair in chain.windows(2) {
            assert_eq!(pair[1].prev_hash, pair[0].hash);
            assert_eq!(pair[1].position, pair[0].position + 1);
        }

        for block in &chain {
            assert_eq!(block.calculate_hash().unwrap(), block.hash);
        }

        assert!(blockchain.validate().is_ok());
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let blockchain = Blockchain::new().unwrap();
        blockchain.append(update("u1", "allergy", "penicillin")).unwrap();

        let mut snapshot = blockchain.snapshot();
        snapshot[1].payload.updated_value = "none".to_string();
        snapshot.pop();

        let chain = blockchain.snapshot();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[1].payload.updated_value, "penicillin");
        assert!(blockchain.is_valid());
    }

    #[test]
    fn test_concurrent_appends() {
        let blockchain = Blockchain::new().unwrap();
        blockchain.append(update("u0", "seed", "0")).unwrap();
        let initial_len = blockchain.len();

        let threads = 16;
        let per_thread = 25;

        thread::scope(|s| {
            for t in 0..threads {
                let blockchain = blockchain.clone();
                s.spawn(move || {
                    for i in 0..per_thread {
                        blockchain
                            .append(update(&format!("u{}", t), "visit", &i.to_string()))
                            .unwrap();
                    }
                });
            }
        });

        let chain = blockchain.snapshot();
        assert_eq!(chain.len(), initial_len + threads * per_thread);

        for (expected, block) in chain.iter().enumerate() {
            assert_eq!(block.position, expected as u64);
        }

        assert!(blockchain.is_valid());
    }

    #[test]
    fn test_submit_with_default_authorization() {
        let blockchain = Blockchain::new().unwrap();

        let block = blockchain
            .submit("anyone", update("u1", "allergy", "penicillin"))
            .unwrap();
        assert_eq!(block.position, 1);
    }

    #[test]
    fn test_submit_unauthorized() {
        let blockchain =
            Blockchain::with_authorization(RoleAllowList::new(["doctor"])).unwrap();

        let err = blockchain
            .submit("visitor", update("u1", "allergy", "penicillin"))
            .unwrap_err();
        assert!(matches!(err, BlockchainError::Unauthorized(ref role) if role == "visitor"));
        assert!(!err.is_fatal());
        assert_eq!(blockchain.len(), 1);

        blockchain
            .submit("doctor", update("u1", "allergy", "penicillin"))
            .unwrap();
        assert_eq!(blockchain.len(), 2);
    }

    #[test]
    fn test_error_fatality() {
        assert!(BlockchainError::EmptyChain.is_fatal());

        let gap = BlockchainError::from(ValidationError::SequenceGap {
            expected: 1,
            found: 2,
        });
        assert!(!gap.is_fatal());

        let overflow = BlockchainError::from(BlockError::PositionOverflow { position: u64::MAX });
        assert!(!overflow.is_fatal());
    }

    #[test]
    fn test_clones_share_state() {
        let blockchain = Blockchain::new().unwrap();
        let other = blockchain.clone();

        other.append(update("u1", "allergy", "penicillin")).unwrap();

        assert_eq!(blockchain.len(), 2);
        assert_eq!(blockchain.last_block(), other.last_block());
        assert!(!blockchain.is_empty());
    }
}
