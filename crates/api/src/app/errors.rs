use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use utoipa::ToSchema;

use warehouse_auth::{AuthzError, TokenError};
use warehouse_core::DomainError;
use warehouse_infra::StoreError;

use crate::app::services::ServiceError;

const NOT_ALLOWED: &str = "not allowed";

/// Body of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    #[schema(example = "validation_error")]
    pub error: String,
    #[schema(example = "Name is required")]
    pub message: String,
}

/// Failure of a request, mapped onto a status code and a stable error code.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    /// Malformed JSON body (message is the extractor's rejection text).
    #[error("{0}")]
    BadRequest(String),

    #[error("invalid item id or it was not provided")]
    InvalidId,

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Store(String),

    #[error("{0}")]
    Token(String),
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::InvalidId => (StatusCode::BAD_REQUEST, "invalid_id"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "store_error"),
            ApiError::Token(_) => (StatusCode::INTERNAL_SERVER_ERROR, "token_error"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(error = %self, code, "request failed");
        }
        json_error(status, code, self.to_string())
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::MissingCredential => ApiError::Unauthorized("authorization header required"),
            AuthzError::InvalidCredential(_) => ApiError::Unauthorized("invalid or expired token"),
            AuthzError::UnknownRole(_) | AuthzError::Forbidden { .. } => ApiError::Unauthorized(NOT_ALLOWED),
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        ApiError::Token(format!("could not issue token: {err}"))
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => ApiError::Validation(msg),
            DomainError::InvalidId(_) => ApiError::InvalidId,
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Domain(e) => e.into(),
            ServiceError::UnknownActor(id) => ApiError::Validation(format!("user {id} does not exist")),
            ServiceError::Store(StoreError::NotFound(msg)) => ApiError::NotFound(msg),
            ServiceError::Store(e @ (StoreError::ConstraintViolation(_) | StoreError::Database(_))) => {
                ApiError::Store(e.to_string())
            }
        }
    }
}
