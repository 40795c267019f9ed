use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, Method},
    middleware::Next,
    response::Response,
};

use warehouse_auth::{AuthzError, TokenService, Verb, authorize};

use crate::app::errors::ApiError;
use crate::context::RoleContext;

#[derive(Clone)]
pub struct AuthState {
    pub tokens: Arc<TokenService>,
}

/// Verify the bearer token and apply the role-by-verb policy.
///
/// Every rejection is a 401 with a generic message; the reason is logged.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let verb = verb_of(req.method());

    let role = check(&state, req.headers(), verb).map_err(|e| {
        tracing::warn!(
            method = %req.method(),
            path = %req.uri().path(),
            reason = %e,
            "request rejected by auth"
        );
        ApiError::from(e)
    })?;

    req.extensions_mut().insert(RoleContext::new(role));
    Ok(next.run(req).await)
}

fn check(state: &AuthState, headers: &HeaderMap, verb: Verb) -> Result<warehouse_auth::Role, AuthzError> {
    let token = extract_bearer(headers).ok_or(AuthzError::MissingCredential)?;

    let claims = state
        .tokens
        .verify(token)
        .map_err(|e| AuthzError::InvalidCredential(e.to_string()))?;

    authorize(&claims.role, verb)
}

pub fn verb_of(method: &Method) -> Verb {
    Verb::from_method(method.as_str())
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?;
    let header = header.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();

    if token.is_empty() {
        return None;
    }
    Some(token)
}
