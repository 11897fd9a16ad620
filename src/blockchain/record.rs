use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use utoipa::openapi::{ObjectBuilder, RefOr, Schema, SchemaType};
use utoipa::ToSchema;

/// Number of digest bytes kept for a wallet address
const WALLET_ADDRESS_BYTES: usize = 16;

/// A patient's medical record
///
/// Only the identifying fields are typed. The clinical sections
/// (`PersonalData`, `CurrentMedications`, `PastMedicalHistory`, ...) sit at
/// the top level of the JSON object and are carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MedicalRecord {
    /// Address derived from the name and creation date
    pub wallet_address: String,

    /// The patient's full name
    pub full_name: String,

    /// When the record was created
    pub creation_date: String,

    /// Clinical sections of the record, keyed by section name
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl<'s> ToSchema<'s> for MedicalRecord {
    fn schema() -> (&'s str, RefOr<Schema>) {
        let text = || ObjectBuilder::new().schema_type(SchemaType::String);

        (
            "MedicalRecord",
            ObjectBuilder::new()
                .property("wallet_address", text())
                .property("full_name", text())
                .property("creation_date", text())
                .description(Some(
                    "Clinical sections are passed as additional top-level properties",
                ))
                .into(),
        )
    }
}

impl MedicalRecord {
    /// Derives the wallet address from the full name and creation date
    pub fn derive_wallet_address(&self) -> String {
        let mut hasher = Sha256::new();

        // Length prefixes keep ("Jane Do", "e...") apart from ("Jane Doe", "...")
        for field in [&self.full_name, &self.creation_date] {
            hasher.update((field.len() as u64).to_be_bytes());
            hasher.update(field.as_bytes());
        }

        hex::encode(&hasher.finalize()[..WALLET_ADDRESS_BYTES])
    }

    /// Replaces any client-supplied wallet address with the derived one
    pub fn assign_wallet_address(&mut self) -> &str {
        self.wallet_address = self.derive_wallet_address();
        &self.wallet_address
    }
}
