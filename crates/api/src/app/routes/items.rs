use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    routing::{get, put},
};

use warehouse_core::{ItemId, UserId};
use warehouse_inventory::{Item, ItemUpdate, NewItem};

use crate::app::dto::{self, CreateItemRequest, StatusResponse, UpdateItemRequest};
use crate::app::errors::{ApiError, ErrorBody};
use crate::app::services::InventoryService;
use crate::context::RoleContext;

pub fn router() -> Router {
    Router::new()
        .route("/items", get(get_items).post(create_item))
        .route("/items/:id", put(update_item).delete(delete_item))
}

/// Create an item.
#[utoipa::path(
    post,
    path = "/items",
    request_body = CreateItemRequest,
    responses(
        (status = 200, description = "Item created", body = Item),
        (status = 400, description = "Invalid body", body = ErrorBody),
        (status = 401, description = "Missing token or role not allowed", body = ErrorBody),
        (status = 500, description = "Store failure", body = ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = "items"
)]
pub async fn create_item(
    Extension(service): Extension<Arc<dyn InventoryService>>,
    Extension(ctx): Extension<RoleContext>,
    body: Result<Json<CreateItemRequest>, JsonRejection>,
) -> Result<Json<Item>, ApiError> {
    let Json(body) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    dto::validate(&body).map_err(ApiError::Validation)?;

    let new_item = NewItem::new(body.name, body.count.unwrap_or_default());
    let item = service.create_item(new_item).await.map_err(|e| {
        tracing::error!(error = %e, "could not create item");
        ApiError::from(e)
    })?;

    tracing::info!(item_id = %item.id, role = %ctx.role(), "item created");
    Ok(Json(item))
}

/// List all items.
#[utoipa::path(
    get,
    path = "/items",
    responses(
        (status = 200, description = "All items", body = Vec<Item>),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 500, description = "Store failure", body = ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = "items"
)]
pub async fn get_items(
    Extension(service): Extension<Arc<dyn InventoryService>>,
) -> Result<Json<Vec<Item>>, ApiError> {
    let items = service.get_all_items().await.map_err(|e| {
        tracing::error!(error = %e, "could not list items");
        ApiError::from(e)
    })?;

    tracing::info!(count = items.len(), "items listed");
    Ok(Json(items))
}

/// Partially update an item; each changed column is recorded in the history
/// of `user_id`.
#[utoipa::path(
    put,
    path = "/items/{id}",
    params(("id" = i64, Path, description = "Item id")),
    request_body = UpdateItemRequest,
    responses(
        (status = 200, description = "Item updated", body = StatusResponse),
        (status = 400, description = "Invalid id, body or acting user", body = ErrorBody),
        (status = 401, description = "Missing token or role not allowed", body = ErrorBody),
        (status = 404, description = "No such item", body = ErrorBody),
        (status = 500, description = "Store failure", body = ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = "items"
)]
pub async fn update_item(
    Extension(service): Extension<Arc<dyn InventoryService>>,
    Extension(ctx): Extension<RoleContext>,
    Path(id): Path<String>,
    body: Result<Json<UpdateItemRequest>, JsonRejection>,
) -> Result<Json<StatusResponse>, ApiError> {
    let id = parse_item_id(&id)?;
    let Json(body) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    dto::validate(&body).map_err(ApiError::Validation)?;

    let update = ItemUpdate {
        id,
        acting_user_id: UserId::new(body.user_id.unwrap_or_default()),
        name: body.name,
        count: body.count,
    };
    let acting_user_id = update.acting_user_id;

    service.update_item(update).await.map_err(|e| {
        tracing::error!(item_id = %id, error = %e, "could not update item");
        ApiError::from(e)
    })?;

    tracing::info!(item_id = %id, %acting_user_id, role = %ctx.role(), "item updated");
    Ok(Json(StatusResponse::updated()))
}

/// Delete an item. Deleting a missing item succeeds.
#[utoipa::path(
    delete,
    path = "/items/{id}",
    params(("id" = i64, Path, description = "Item id")),
    responses(
        (status = 200, description = "Item deleted", body = StatusResponse),
        (status = 400, description = "Invalid id", body = ErrorBody),
        (status = 401, description = "Missing token or role not allowed", body = ErrorBody),
        (status = 500, description = "Store failure", body = ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = "items"
)]
pub async fn delete_item(
    Extension(service): Extension<Arc<dyn InventoryService>>,
    Extension(ctx): Extension<RoleContext>,
    Path(id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let id = parse_item_id(&id)?;

    service.delete_item(id).await.map_err(|e| {
        tracing::error!(item_id = %id, error = %e, "could not delete item");
        ApiError::from(e)
    })?;

    tracing::info!(item_id = %id, role = %ctx.role(), "item deleted");
    Ok(Json(StatusResponse::deleted()))
}

fn parse_item_id(raw: &str) -> Result<ItemId, ApiError> {
    raw.parse::<ItemId>().map_err(|e| {
        tracing::warn!(raw, error = %e, "invalid item id");
        ApiError::InvalidId
    })
}
