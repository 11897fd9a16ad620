use serde::Serialize;

/// Data carried by a block
///
/// The ledger never looks inside a payload. It only needs a canonical byte
/// form to feed into the block hash, and a way to build and recognize the
/// payload of the genesis block.
pub trait Payload: Serialize + Clone + Send + Sync + 'static {
    /// Builds the payload of the genesis block
    fn genesis() -> Self;

    /// Whether this payload marks the genesis block
    fn is_genesis(&self) -> bool;

    /// Serializes the payload to the bytes that are hashed
    ///
    /// The default uses compact JSON, which is deterministic for structs
    /// and for `serde_json` maps (keys are kept sorted).
    fn canonical_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}
