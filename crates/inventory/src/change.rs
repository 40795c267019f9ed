//! Audit trail model: per-column item changes and the per-user history view.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use warehouse_auth::Role;
use warehouse_core::{ItemId, UserId};

use crate::User;

/// Audited column of the `items` table.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ItemColumn {
    Name,
    Count,
}

impl ItemColumn {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemColumn::Name => "name",
            ItemColumn::Count => "count",
        }
    }
}

/// One recorded modification of one item column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Change {
    #[schema(value_type = i64)]
    pub item_id: ItemId,
    pub changed_column: String,
    /// Previous value, stringified.
    pub changed_from: String,
    pub change_time: DateTime<Utc>,
}

/// A user together with every change attributed to it, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserHistory {
    #[schema(value_type = i64)]
    pub id: UserId,
    pub name: String,
    #[schema(value_type = String, example = "manager")]
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub history: Vec<Change>,
}

impl UserHistory {
    /// Build the view for `user`, sorting `changes` by `change_time` ascending.
    pub fn new(user: User, mut changes: Vec<Change>) -> Self {
        changes.sort_by_key(|c| c.change_time);
        Self {
            id: user.id,
            name: user.name,
            role: user.role,
            created_at: user.created_at,
            history: changes,
        }
    }
}
