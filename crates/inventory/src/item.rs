use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use warehouse_core::{DomainError, DomainResult, ItemId, UserId};

/// A stocked inventory item as persisted by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Item {
    #[schema(value_type = i64)]
    pub id: ItemId,
    pub name: String,
    pub count: i64,
    pub created_at: DateTime<Utc>,
}

/// Input for creating an item. `id` and `created_at` are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub name: String,
    pub count: i64,
}

impl NewItem {
    pub fn new(name: impl Into<String>, count: i64) -> Self {
        Self {
            name: name.into(),
            count,
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        validate_name(&self.name)?;
        validate_count(self.count)
    }
}

/// Partial update of an item, attributed to `acting_user_id`.
///
/// `None` leaves the corresponding column untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemUpdate {
    pub id: ItemId,
    pub acting_user_id: UserId,
    pub name: Option<String>,
    pub count: Option<i64>,
}

impl ItemUpdate {
    pub fn new(id: ItemId, acting_user_id: UserId) -> Self {
        Self {
            id,
            acting_user_id,
            name: None,
            count: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_count(mut self, count: i64) -> Self {
        self.count = Some(count);
        self
    }

    pub fn validate(&self) -> DomainResult<()> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(count) = self.count {
            validate_count(count)?;
        }
        Ok(())
    }

    /// Apply this update to `item`, returning the previous value of every
    /// column whose value actually changed.
    pub fn apply_to(&self, item: &mut Item) -> Vec<(crate::ItemColumn, String)> {
        let mut changed = Vec::new();

        if let Some(name) = &self.name {
            if *name != item.name {
                changed.push((crate::ItemColumn::Name, std::mem::replace(&mut item.name, name.clone())));
            }
        }
        if let Some(count) = self.count {
            if count != item.count {
                changed.push((crate::ItemColumn::Count, item.count.to_string()));
                item.count = count;
            }
        }

        changed
    }
}

fn validate_name(name: &str) -> DomainResult<()> {
    if name.trim().is_empty() {
        return Err(DomainError::validation("name cannot be empty"));
    }
    Ok(())
}

fn validate_count(count: i64) -> DomainResult<()> {
    if count < 0 {
        return Err(DomainError::validation("count cannot be negative"));
    }
    Ok(())
}
