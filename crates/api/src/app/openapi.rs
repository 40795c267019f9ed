//! OpenAPI document for the HTTP surface, served at `/swagger/openapi.json`.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use warehouse_inventory::{Change, Item, User, UserHistory};

use crate::app::dto::{CreateItemRequest, CreateUserRequest, StatusResponse, UpdateItemRequest};
use crate::app::errors::ErrorBody;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Token returned by POST /users. Carries the caller's role."))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Warehouse Control API",
        version = "0.1.0",
        description = "Inventory items, users and the audit history of item changes.\n\nRoles: `admin` may do everything, `manager` may read and update items, `viewer` may only read."
    ),
    paths(
        crate::app::routes::users::create_user,
        crate::app::routes::users::get_users_history,
        crate::app::routes::items::create_item,
        crate::app::routes::items::get_items,
        crate::app::routes::items::update_item,
        crate::app::routes::items::delete_item,
        crate::app::routes::system::health,
    ),
    components(schemas(
        Item,
        User,
        Change,
        UserHistory,
        CreateUserRequest,
        CreateItemRequest,
        UpdateItemRequest,
        StatusResponse,
        ErrorBody,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "items", description = "Inventory items"),
        (name = "users", description = "Users and change history"),
        (name = "system", description = "Health"),
    )
)]
pub struct ApiDoc;
