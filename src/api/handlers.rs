use actix_web::{http::StatusCode, web, HttpResponse, Responder};
use log::error;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::blockchain::validator::validate_chain as validate_blocks;
use crate::blockchain::{BlockchainError, MedicalRecord, RecordBlock, RecordLedger, Transaction};

/// Data structure for the ledger state
pub type LedgerData = web::Data<RecordLedger>;

/// Response for the chain endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ChainResponse {
    /// The length of the chain
    pub length: usize,

    /// The blocks in the chain, genesis first
    #[schema(value_type = Vec<Object>)]
    pub chain: Vec<RecordBlock>,

    /// Whether the chain is valid
    pub is_valid: bool,
}

impl ChainResponse {
    /// Builds the response from one snapshot, validating that same snapshot
    pub fn from_snapshot(chain: Vec<RecordBlock>) -> Self {
        let is_valid = !chain.is_empty() && validate_blocks(&chain).is_ok();

        ChainResponse {
            length: chain.len(),
            chain,
            is_valid,
        }
    }
}

/// Response for the write block endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct BlockResponse {
    /// The message
    pub message: String,

    /// The appended block
    #[schema(value_type = Object)]
    pub block: RecordBlock,
}

/// Error body returned by every endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// What went wrong
    pub error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> HttpResponse {
    HttpResponse::build(status).json(ErrorResponse {
        error: message.into(),
    })
}

fn status_for(err: &BlockchainError) -> StatusCode {
    match err {
        BlockchainError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        BlockchainError::Validation(_) => StatusCode::CONFLICT,
        BlockchainError::EmptyChain | BlockchainError::Block(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Get the full ledger
///
/// Returns the entire chain as indented JSON along with its validity status
#[utoipa::path(
    get,
    path = "/api/v1/chain",
    responses(
        (status = 200, description = "Chain retrieved successfully", body = ChainResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn get_chain(ledger: LedgerData) -> impl Responder {
    let response = ChainResponse::from_snapshot(ledger.snapshot());

    match serde_json::to_string_pretty(&response) {
        Ok(body) => HttpResponse::Ok()
            .content_type("application/json")
            .body(body),
        Err(err) => {
            error!("Failed to render chain: {}", err);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "could not render chain")
        }
    }
}

/// Write a new block
///
/// Appends a record change to the ledger on behalf of the transaction's role
#[utoipa::path(
    post,
    path = "/api/v1/blocks",
    request_body = Transaction,
    responses(
        (status = 201, description = "Block appended successfully", body = BlockResponse),
        (status = 401, description = "Role not authorized", body = ErrorResponse),
        (status = 409, description = "Block failed validation", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn write_block(
    ledger: LedgerData,
    transaction: web::Json<Transaction>,
) -> impl Responder {
    let transaction = transaction.into_inner();
    let role = transaction.user_role.clone();

    match ledger.submit(&role, transaction) {
        Ok(block) => HttpResponse::Created().json(BlockResponse {
            message: "Block appended".to_string(),
            block,
        }),
        Err(err) => {
            if err.is_fatal() {
                error!("Ledger is corrupted: {}", err);
            }
            error_response(status_for(&err), format!("could not write block: {}", err))
        }
    }
}

/// Check if the ledger is valid
///
/// Validates the entire chain
#[utoipa::path(
    get,
    path = "/api/v1/validate",
    responses(
        (status = 200, description = "Ledger validation status", body = bool)
    )
)]
pub async fn validate_chain(ledger: LedgerData) -> impl Responder {
    HttpResponse::Ok().json(ledger.is_valid())
}

/// Register a medical record
///
/// Assigns the record its wallet address and echoes it back
#[utoipa::path(
    post,
    path = "/api/v1/records",
    request_body = MedicalRecord,
    responses(
        (status = 200, description = "Record registered successfully", body = MedicalRecord),
        (status = 400, description = "Invalid record data")
    )
)]
pub async fn new_medical_record(record: web::Json<MedicalRecord>) -> impl Responder {
    let mut record = record.into_inner();
    record.assign_wallet_address();

    HttpResponse::Ok().json(record)
}
