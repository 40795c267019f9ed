use axum::{Router, routing::get};

pub mod items;
pub mod pages;
pub mod system;
pub mod users;

/// Endpoints that require a bearer token.
pub fn router() -> Router {
    Router::new().merge(items::router()).merge(users::router())
}

/// Endpoints open to anyone.
pub fn public_router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/swagger/openapi.json", get(system::openapi))
        .route("/login", get(pages::login))
        .route("/main", get(pages::main_page))
        .merge(users::public_router())
}
