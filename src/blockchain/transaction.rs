use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::payload::Payload;

/// A change to one key of a patient's medical record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct Transaction {
    /// Wallet address of the medical record being changed
    pub wallet_address: String,

    /// The user making the change
    pub user_id: String,

    /// The role the user acts under
    pub user_role: String,

    /// The record key that changed
    pub updated_key: String,

    /// The new value of the key
    pub updated_value: String,

    /// Set only on the genesis block's payload
    pub is_genesis: bool,
}

impl Payload for Transaction {
    fn genesis() -> Self {
        Transaction {
            is_genesis: true,
            ..Transaction::default()
        }
    }

    fn is_genesis(&self) -> bool {
        self.is_genesis
    }
}
