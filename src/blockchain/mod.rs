// Blockchain module
//
// This module contains the ledger implementation:
// - Block structure and hashing
// - Chain validation
// - The append-only ledger
// - Payload and authorization seams
// - Medical record payloads

pub mod auth;
pub mod block;
pub mod chain;
pub mod payload;
pub mod record;
pub mod transaction;
pub mod validator;

// Re-export main components for easier access
pub use auth::{AllowAll, AuthorizationCheck, RoleAllowList};
pub use block::{Block, BlockError};
pub use chain::{Blockchain, BlockchainError};
pub use payload::Payload;
pub use record::MedicalRecord;
pub use transaction::Transaction;
pub use validator::ValidationError;

/// The ledger used by the service
pub type RecordLedger = Blockchain<Transaction>;

/// A block of the service's ledger
pub type RecordBlock = Block<Transaction>;
