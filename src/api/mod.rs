// API module
//
// HTTP surface of the ledger: chain inspection, block writes and record registration

pub mod handlers;
pub mod routes;

// Re-export main components for easier access
pub use routes::configure_routes;
