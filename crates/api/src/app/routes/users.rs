use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, rejection::JsonRejection},
    routing::{get, post},
};

use warehouse_auth::{Role, TokenService};
use warehouse_inventory::{NewUser, User, UserHistory};

use crate::app::dto::{self, CreateUserRequest};
use crate::app::errors::{ApiError, ErrorBody};
use crate::app::services::InventoryService;

/// `POST /users` (public).
pub fn public_router() -> Router {
    Router::new().route("/users", post(create_user))
}

/// `GET /users/history` (authenticated).
pub fn router() -> Router {
    Router::new().route("/users/history", get(get_users_history))
}

/// Register a user and return it with a token for its role.
#[utoipa::path(
    post,
    path = "/users",
    request_body = CreateUserRequest,
    responses(
        (status = 200, description = "User created; `token` carries the role", body = User),
        (status = 400, description = "Invalid body or unknown role", body = ErrorBody),
        (status = 500, description = "Store or token failure", body = ErrorBody),
    ),
    tag = "users"
)]
pub async fn create_user(
    Extension(service): Extension<Arc<dyn InventoryService>>,
    Extension(tokens): Extension<Arc<TokenService>>,
    body: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<Json<User>, ApiError> {
    let Json(body) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    dto::validate(&body).map_err(ApiError::Validation)?;

    let role: Role = body
        .role
        .parse()
        .map_err(|_| ApiError::Validation("Role is not valid due to oneof".to_string()))?;

    // Issued first so a signing failure leaves no user behind.
    let token = tokens.issue(role).map_err(|e| {
        tracing::error!(error = %e, "could not issue token");
        ApiError::from(e)
    })?;

    let user = service.create_user(NewUser::new(body.name, role)).await.map_err(|e| {
        tracing::error!(error = %e, "could not create user");
        ApiError::from(e)
    })?;

    tracing::info!(user_id = %user.id, role = %user.role, "user created");
    Ok(Json(user.with_token(token)))
}

/// Every user with the item changes attributed to it.
#[utoipa::path(
    get,
    path = "/users/history",
    responses(
        (status = 200, description = "Per-user change history", body = Vec<UserHistory>),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 500, description = "Store failure", body = ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn get_users_history(
    Extension(service): Extension<Arc<dyn InventoryService>>,
) -> Result<Json<Vec<UserHistory>>, ApiError> {
    let history = service.get_users_with_changes().await.map_err(|e| {
        tracing::error!(error = %e, "could not load users history");
        ApiError::from(e)
    })?;

    Ok(Json(history))
}
