//! Request/response DTOs and the mapping of validation failures to messages.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

use warehouse_auth::Role;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    #[serde(default)]
    #[validate(length(min = 1, code = "required"))]
    #[schema(example = "ann")]
    pub name: String,

    #[serde(default)]
    #[validate(length(min = 1, code = "required"), custom(function = "known_role"))]
    #[schema(example = "admin")]
    pub role: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateItemRequest {
    #[serde(default)]
    #[validate(length(min = 1, code = "required"))]
    #[schema(example = "bolt")]
    pub name: String,

    #[validate(required(code = "required"), range(min = 0, code = "min"))]
    #[schema(example = 5)]
    pub count: Option<i64>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateItemRequest {
    /// User the change is attributed to.
    #[validate(required(code = "required"), range(min = 1, code = "required"))]
    #[schema(example = 1)]
    pub user_id: Option<i64>,

    #[validate(length(min = 1, code = "required"))]
    pub name: Option<String>,

    #[validate(range(min = 0, code = "min"))]
    pub count: Option<i64>,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusResponse {
    #[schema(example = "successfully updated item")]
    pub status: String,
}

impl StatusResponse {
    pub fn updated() -> Self {
        Self {
            status: "successfully updated item".to_string(),
        }
    }

    pub fn deleted() -> Self {
        Self {
            status: "successfully deleted item".to_string(),
        }
    }
}

#[allow(clippy::ptr_arg)]
fn known_role(role: &String) -> Result<(), ValidationError> {
    // Empty is reported by the `required` rule.
    if role.is_empty() || role.parse::<Role>().is_ok() {
        return Ok(());
    }
    Err(ValidationError::new("oneof"))
}

/// Run the DTO's rules and render failures as a single message.
pub fn validate<T: Validate>(dto: &T) -> Result<(), String> {
    dto.validate().map_err(|errs| validation_message(&errs))
}

/// One message per failing field (`"Name is required"`,
/// `"Count is not valid due to min"`), joined with `"; "` in field-name order.
pub fn validation_message(errs: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errs.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    fields
        .into_iter()
        .filter_map(|(field, errors)| {
            let first = errors.first()?;
            let label = field_label(&field);
            Some(if first.code == "required" {
                format!("{label} is required")
            } else {
                format!("{label} is not valid due to {}", first.code)
            })
        })
        .collect::<Vec<_>>()
        .join("; ")
}

fn field_label(field: &str) -> String {
    match field {
        "user_id" => "UserID".to_string(),
        other => {
            let mut chars = other.chars();
            match chars.next() {
                Some(c) => c.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        }
    }
}
