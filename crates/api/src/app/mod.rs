//! HTTP application wiring (Axum router + service wiring).
//!
//! - `services.rs`: the `InventoryService` seam and its store-backed implementation
//! - `routes/`: HTTP handlers (one file per resource)
//! - `dto.rs`: request/response DTOs and validation messages
//! - `errors.rs`: error-to-response mapping
//! - `openapi.rs`: generated API document

use std::sync::Arc;
use std::time::Duration;

use axum::{Extension, Router};
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use warehouse_auth::TokenService;
use warehouse_infra::DbInitError;

use crate::config::AppConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod openapi;
pub mod routes;
pub mod services;

#[cfg(test)]
mod tests;

/// Build the full HTTP router from configuration (used by `main.rs`).
pub async fn build_app(config: &AppConfig) -> Result<Router, DbInitError> {
    let service = services::build_service(config).await?;
    let tokens = Arc::new(TokenService::new(config.secret.clone()));

    Ok(router(service, tokens, config.http.request_timeout()))
}

/// Assemble the router around an already-built service.
pub fn router(
    service: Arc<dyn services::InventoryService>,
    tokens: Arc<TokenService>,
    request_timeout: Duration,
) -> Router {
    let auth_state = middleware::AuthState {
        tokens: tokens.clone(),
    };

    let protected = routes::router().layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    Router::new()
        .merge(routes::public_router())
        .merge(protected)
        .layer(Extension(service))
        .layer(Extension(tokens))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(request_timeout)),
        )
}
