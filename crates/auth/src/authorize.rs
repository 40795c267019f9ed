use core::str::FromStr;

use thiserror::Error;

use crate::Role;

/// Request verb as seen by the policy.
///
/// Kept independent of any HTTP crate; the transport maps its method onto this.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
    Put,
    Delete,
    /// Any verb the policy does not list explicitly (HEAD, PATCH, OPTIONS, ...).
    Other,
}

impl Verb {
    pub fn from_method(method: &str) -> Self {
        match method {
            "GET" => Verb::Get,
            "POST" => Verb::Post,
            "PUT" => Verb::Put,
            "DELETE" => Verb::Delete,
            _ => Verb::Other,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        matches!(self, Decision::Allow)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("missing bearer credential")]
    MissingCredential,

    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    #[error("unknown role '{0}'")]
    UnknownRole(String),

    #[error("role '{role}' may not perform {verb:?}")]
    Forbidden { role: Role, verb: Verb },
}

/// Map a recognized role and a verb to a decision.
///
/// - No IO
/// - No state between calls
pub fn decide(role: Role, verb: Verb) -> Decision {
    let allowed = match verb {
        Verb::Post | Verb::Delete => role == Role::Admin,
        Verb::Put => matches!(role, Role::Admin | Role::Manager),
        Verb::Get | Verb::Other => true,
    };

    if allowed { Decision::Allow } else { Decision::Deny }
}

/// Authorize a verified role claim for `verb`.
///
/// Returns the parsed role on success so the caller can attach it to the
/// request context.
pub fn authorize(role_claim: &str, verb: Verb) -> Result<Role, AuthzError> {
    let role = Role::from_str(role_claim).map_err(|e| AuthzError::UnknownRole(e.0))?;

    match decide(role, verb) {
        Decision::Allow => Ok(role),
        Decision::Deny => Err(AuthzError::Forbidden { role, verb }),
    }
}
