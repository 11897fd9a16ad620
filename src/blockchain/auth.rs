use std::collections::HashSet;

/// Decides whether a role may append to the ledger
pub trait AuthorizationCheck: Send + Sync {
    fn is_authorized(&self, role: &str) -> bool;
}

/// Accepts every role
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl AuthorizationCheck for AllowAll {
    fn is_authorized(&self, _role: &str) -> bool {
        true
    }
}

/// Accepts only the listed roles
#[derive(Debug, Clone, Default)]
pub struct RoleAllowList {
    roles: HashSet<String>,
}

impl RoleAllowList {
    pub fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RoleAllowList {
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }
}

impl AuthorizationCheck for RoleAllowList {
    fn is_authorized(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

impl<F> AuthorizationCheck for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_authorized(&self, role: &str) -> bool {
        self(role)
    }
}
