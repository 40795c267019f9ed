//! Handler tests: the real router driven with `oneshot` over a fake service.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use warehouse_auth::{Role, TokenService};
use warehouse_core::{ItemId, UserId};
use warehouse_infra::StoreError;
use warehouse_inventory::{Item, ItemUpdate, NewItem, NewUser, User, UserHistory};

use super::router;
use super::services::{InventoryService, ServiceError};

const SECRET: &str = "handler-test-secret";

/// Records calls; fails every call when `broken` is set.
#[derive(Default)]
struct FakeService {
    broken: bool,
    updates: Mutex<Vec<ItemUpdate>>,
    created_users: Mutex<Vec<NewUser>>,
}

impl FakeService {
    fn check(&self) -> Result<(), ServiceError> {
        if self.broken {
            return Err(ServiceError::Store(StoreError::Database("connection refused".into())));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl InventoryService for FakeService {
    async fn create_item(&self, item: NewItem) -> Result<Item, ServiceError> {
        self.check()?;
        Ok(Item {
            id: ItemId::new(1),
            name: item.name,
            count: item.count,
            created_at: Utc::now(),
        })
    }

    async fn create_user(&self, user: NewUser) -> Result<User, ServiceError> {
        self.check()?;
        self.created_users.lock().unwrap().push(user.clone());
        Ok(User {
            id: UserId::new(1),
            name: user.name,
            role: user.role,
            created_at: Utc::now(),
            token: None,
        })
    }

    async fn get_all_items(&self) -> Result<Vec<Item>, ServiceError> {
        self.check()?;
        Ok(Vec::new())
    }

    async fn get_user_role(&self, _id: UserId) -> Result<Role, ServiceError> {
        self.check()?;
        Ok(Role::Admin)
    }

    async fn update_item(&self, update: ItemUpdate) -> Result<(), ServiceError> {
        self.check()?;
        if update.id == ItemId::new(9999) {
            return Err(ServiceError::Store(StoreError::NotFound("item 9999".into())));
        }
        if update.acting_user_id == UserId::new(404) {
            return Err(ServiceError::UnknownActor(update.acting_user_id));
        }
        self.updates.lock().unwrap().push(update);
        Ok(())
    }

    async fn delete_item(&self, _id: ItemId) -> Result<(), ServiceError> {
        self.check()?;
        Ok(())
    }

    async fn get_users_with_changes(&self) -> Result<Vec<UserHistory>, ServiceError> {
        self.check()?;
        Ok(Vec::new())
    }
}

fn app(service: Arc<FakeService>) -> Router {
    router(service, Arc::new(TokenService::new(SECRET)), Duration::from_secs(5))
}

fn token(role: Role) -> String {
    TokenService::new(SECRET).issue(role).unwrap()
}

fn request(method: Method, uri: &str, role: Option<Role>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(role) = role {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token(role)));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = app.oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn create_item_as_admin_returns_item() {
    let (status, body) = send(
        app(Arc::default()),
        request(Method::POST, "/items", Some(Role::Admin), Some(json!({"name": "bolt", "count": 5}))),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "bolt");
    assert_eq!(body["count"], 5);
}

#[tokio::test]
async fn role_policy_is_enforced_per_verb() {
    let cases = [
        (Method::POST, "/items", Role::Manager, StatusCode::UNAUTHORIZED),
        (Method::POST, "/items", Role::Viewer, StatusCode::UNAUTHORIZED),
        (Method::DELETE, "/items/1", Role::Manager, StatusCode::UNAUTHORIZED),
        (Method::PUT, "/items/1", Role::Viewer, StatusCode::UNAUTHORIZED),
        (Method::PUT, "/items/1", Role::Manager, StatusCode::OK),
        (Method::GET, "/items", Role::Viewer, StatusCode::OK),
        (Method::GET, "/users/history", Role::Viewer, StatusCode::OK),
        (Method::DELETE, "/items/1", Role::Admin, StatusCode::OK),
    ];

    for (method, uri, role, expected) in cases {
        let body = match method {
            Method::POST => Some(json!({"name": "bolt", "count": 1})),
            Method::PUT => Some(json!({"user_id": 1, "count": 2})),
            _ => None,
        };
        let (status, json) = send(app(Arc::default()), request(method.clone(), uri, Some(role), body)).await;
        assert_eq!(status, expected, "{method} {uri} as {role}");
        if status == StatusCode::UNAUTHORIZED {
            assert_eq!(json["error"], "unauthorized");
            assert_eq!(json["message"], "not allowed");
        }
    }
}

#[tokio::test]
async fn missing_and_invalid_tokens_are_rejected() {
    let (status, body) = send(app(Arc::default()), request(Method::GET, "/items", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "authorization header required");

    let req = Request::builder()
        .uri("/items")
        .header(header::AUTHORIZATION, "Bearer not-a-jwt")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app(Arc::default()), req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "invalid or expired token");

    let foreign = TokenService::new("other-secret").issue(Role::Admin).unwrap();
    let req = Request::builder()
        .uri("/items")
        .header(header::AUTHORIZATION, format!("Bearer {foreign}"))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(app(Arc::default()), req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_user_is_public_and_returns_a_token() {
    let service = Arc::new(FakeService::default());
    let (status, body) = send(
        app(service.clone()),
        request(Method::POST, "/users", None, Some(json!({"name": "ann", "role": "manager"}))),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "manager");
    let token = body["token"].as_str().unwrap();
    let claims = TokenService::new(SECRET).verify(token).unwrap();
    assert_eq!(claims.role, "manager");
    assert_eq!(service.created_users.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn create_user_validation_messages() {
    let cases = [
        (json!({"name": "", "role": "admin"}), "Name is required"),
        (json!({"name": "ann"}), "Role is required"),
        (json!({"name": "ann", "role": "root"}), "Role is not valid due to oneof"),
    ];

    for (payload, message) in cases {
        let service = Arc::new(FakeService::default());
        let (status, body) = send(app(service.clone()), request(Method::POST, "/users", None, Some(payload))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_error");
        assert_eq!(body["message"], message);
        assert!(service.created_users.lock().unwrap().is_empty());
    }
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let req = Request::builder()
        .method(Method::POST)
        .uri("/items")
        .header(header::AUTHORIZATION, format!("Bearer {}", token(Role::Admin)))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"name": "bolt", "count": "five"}"#))
        .unwrap();

    let (status, body) = send(app(Arc::default()), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn create_item_validation_messages() {
    let cases = [
        (json!({"name": "bolt"}), "Count is required"),
        (json!({"name": "bolt", "count": -1}), "Count is not valid due to min"),
        (json!({"count": 1}), "Name is required"),
    ];

    for (payload, message) in cases {
        let (status, body) = send(
            app(Arc::default()),
            request(Method::POST, "/items", Some(Role::Admin), Some(payload)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], message);
    }
}

#[tokio::test]
async fn update_passes_partial_fields_to_the_service() {
    let service = Arc::new(FakeService::default());
    let (status, body) = send(
        app(service.clone()),
        request(Method::PUT, "/items/7", Some(Role::Manager), Some(json!({"user_id": 3, "count": 9}))),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "successfully updated item");

    let updates = service.updates.lock().unwrap();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].id, ItemId::new(7));
    assert_eq!(updates[0].acting_user_id, UserId::new(3));
    assert_eq!(updates[0].name, None);
    assert_eq!(updates[0].count, Some(9));
}

#[tokio::test]
async fn update_error_statuses() {
    let cases = [
        ("/items/abc", json!({"user_id": 1}), StatusCode::BAD_REQUEST, "invalid_id"),
        ("/items/1", json!({"count": 1}), StatusCode::BAD_REQUEST, "validation_error"),
        ("/items/1", json!({"user_id": 404, "count": 1}), StatusCode::BAD_REQUEST, "validation_error"),
        ("/items/9999", json!({"user_id": 1, "name": "x"}), StatusCode::NOT_FOUND, "not_found"),
    ];

    for (uri, payload, status, code) in cases {
        let (got, body) = send(
            app(Arc::default()),
            request(Method::PUT, uri, Some(Role::Admin), Some(payload)),
        )
        .await;
        assert_eq!(got, status, "{uri}");
        assert_eq!(body["error"], code, "{uri}");
    }
}

#[tokio::test]
async fn invalid_id_message_on_delete() {
    let (status, body) = send(
        app(Arc::default()),
        request(Method::DELETE, "/items/x1", Some(Role::Admin), None),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "invalid item id or it was not provided");
}

#[tokio::test]
async fn store_failures_are_500() {
    let service = Arc::new(FakeService {
        broken: true,
        ..FakeService::default()
    });

    let (status, body) = send(app(service), request(Method::GET, "/items", Some(Role::Viewer), None)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "store_error");
}

#[tokio::test]
async fn public_pages_and_docs_are_served() {
    for uri in ["/login", "/main"] {
        let res = app(Arc::default())
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK, "{uri}");
        let content_type = res.headers()[header::CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.starts_with("text/html"));
    }

    let (status, body) = send(app(Arc::default()), request(Method::GET, "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = send(
        app(Arc::default()),
        request(Method::GET, "/swagger/openapi.json", None, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/items/{id}"].is_object());
}
