use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Role;

/// Claims carried by a warehouse token.
///
/// Tokens bear no user identity: the role alone drives authorization, so a
/// verified token never needs a store lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Role claim as issued. Kept as a string so the policy layer decides
    /// whether it is a recognized role.
    pub role: String,

    /// Absolute expiry, unix seconds.
    pub exp: i64,
}

impl TokenClaims {
    pub fn new(role: Role, expires_at: DateTime<Utc>) -> Self {
        Self {
            role: role.as_str().to_string(),
            exp: expires_at.timestamp(),
        }
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token signature does not match")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,

    #[error("token claims are malformed: {0}")]
    MalformedClaims(String),

    #[error("token is malformed: {0}")]
    Malformed(String),

    #[error("could not sign token: {0}")]
    Signing(String),
}

/// Deterministically validate claims against `now`.
///
/// Signature verification happens before this, in [`crate::token`].
pub fn validate_claims(claims: &TokenClaims, now: DateTime<Utc>) -> Result<(), TokenError> {
    if now.timestamp() >= claims.exp {
        return Err(TokenError::Expired);
    }
    Ok(())
}

/// Extract typed claims from a decoded (signature-checked) JWT payload.
pub(crate) fn claims_from_payload(payload: &serde_json::Value) -> Result<TokenClaims, TokenError> {
    let object = payload
        .as_object()
        .ok_or_else(|| TokenError::MalformedClaims("payload is not an object".to_string()))?;

    let role = match object.get("role") {
        Some(serde_json::Value::String(role)) => role.clone(),
        Some(_) => return Err(TokenError::MalformedClaims("role claim is not a string".to_string())),
        None => return Err(TokenError::MalformedClaims("role claim is missing".to_string())),
    };

    let exp = object
        .get("exp")
        .and_then(serde_json::Value::as_i64)
        .ok_or_else(|| TokenError::MalformedClaims("exp claim is missing or not an integer".to_string()))?;

    Ok(TokenClaims { role, exp })
}
