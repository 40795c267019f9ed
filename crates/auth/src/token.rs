//! HS256 token issuance and verification.
//!
//! Pure cryptographic transform: no IO, no retries. Any verification failure
//! must be treated as a deny by the caller.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::claims::{claims_from_payload, validate_claims};
use crate::{Role, TokenClaims, TokenError};

/// Lifetime of an issued token.
pub const TOKEN_TTL_HOURS: i64 = 3;

/// Issue a signed token for `role`, expiring three hours from now.
pub fn issue(secret: &[u8], role: Role) -> Result<String, TokenError> {
    issue_at(secret, role, Utc::now())
}

/// Issue a signed token as if it were issued at `issued_at`.
pub fn issue_at(secret: &[u8], role: Role, issued_at: DateTime<Utc>) -> Result<String, TokenError> {
    let claims = TokenClaims::new(role, issued_at + Duration::hours(TOKEN_TTL_HOURS));

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| TokenError::Signing(e.to_string()))
}

/// Verify a token's signature and claims against the current time.
pub fn verify(secret: &[u8], token: &str) -> Result<TokenClaims, TokenError> {
    verify_at(secret, token, Utc::now())
}

/// Verify a token's signature and claims against `now`.
pub fn verify_at(secret: &[u8], token: &str, now: DateTime<Utc>) -> Result<TokenClaims, TokenError> {
    // Expiry is checked by `validate_claims` so it stays deterministic and
    // leeway-free; the library only checks signature and algorithm here.
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.leeway = 0;
    validation.required_spec_claims = HashSet::new();

    let decoded = jsonwebtoken::decode::<serde_json::Value>(
        token,
        &DecodingKey::from_secret(secret),
        &validation,
    )
    .map_err(|e| match e.kind() {
        ErrorKind::InvalidSignature => TokenError::InvalidSignature,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::Json(err) => TokenError::MalformedClaims(err.to_string()),
        _ => TokenError::Malformed(e.to_string()),
    })?;

    let claims = claims_from_payload(&decoded.claims)?;
    validate_claims(&claims, now)?;
    Ok(claims)
}

/// Token service bound to a signing secret.
///
/// Constructed once from configuration and shared by reference.
#[derive(Clone)]
pub struct TokenService {
    secret: Vec<u8>,
}

impl TokenService {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    pub fn issue(&self, role: Role) -> Result<String, TokenError> {
        issue(&self.secret, role)
    }

    pub fn verify(&self, token: &str) -> Result<TokenClaims, TokenError> {
        verify(&self.secret, token)
    }
}

impl core::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenService").finish_non_exhaustive()
    }
}
