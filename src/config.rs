use std::sync::Arc;

use clap::Parser;

use crate::blockchain::{AllowAll, AuthorizationCheck, RoleAllowList};

/// EMR ledger service.
///
/// Records medical record changes in an in-memory, hash-linked ledger and
/// serves it over HTTP.
#[derive(Parser, Debug, Clone)]
#[command(name = "emr_ledger", version, about)]
pub struct Settings {
    /// Address the HTTP server binds to
    #[arg(long, env = "EMR_LEDGER_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port the HTTP server listens on
    #[arg(long, short = 'p', env = "EMR_LEDGER_PORT", default_value_t = 3001)]
    pub port: u16,

    /// Roles allowed to append blocks (comma separated; empty allows every role)
    #[arg(long, env = "EMR_LEDGER_ALLOWED_ROLES", value_delimiter = ',')]
    pub allowed_roles: Vec<String>,

    /// Default log filter when RUST_LOG is not set
    #[arg(long, env = "EMR_LEDGER_LOG", default_value = "info")]
    pub log_level: String,
}

impl Settings {
    /// Builds the authorization check described by `allowed_roles`
    pub fn authorization(&self) -> Arc<dyn AuthorizationCheck> {
        let roles: Vec<&str> = self
            .allowed_roles
            .iter()
            .map(|role| role.trim())
            .filter(|role| !role.is_empty())
            .collect();

        if roles.is_empty() {
            Arc::new(AllowAll)
        } else {
            Arc::new(RoleAllowList::new(roles))
        }
    }
}
