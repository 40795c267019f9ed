//! Inventory persistence abstractions.

pub mod in_memory;
pub mod postgres;

use std::sync::Arc;

use thiserror::Error;

use warehouse_auth::Role;
use warehouse_core::{ItemId, UserId};
use warehouse_inventory::{Item, ItemUpdate, NewItem, NewUser, User, UserHistory};

pub use in_memory::InMemoryInventoryStore;
pub use postgres::PostgresInventoryStore;

/// Store-level failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    /// A schema constraint rejected the write (empty name, negative count,
    /// unknown acting user).
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("database error: {0}")]
    Database(String),
}

/// Persistence of items, users and the item change log.
///
/// Every successful `update_item` that changes a column appends exactly one
/// change record per changed column, attributed to `acting_user_id`, in the
/// same atomic unit as the update itself.
#[async_trait::async_trait]
pub trait InventoryStore: Send + Sync {
    async fn create_item(&self, item: NewItem) -> Result<Item, StoreError>;

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;

    /// All items, in no particular order.
    async fn get_all_items(&self) -> Result<Vec<Item>, StoreError>;

    async fn get_user_role(&self, id: UserId) -> Result<Role, StoreError>;

    /// Partially update an item. `NotFound` when no item has `update.id`.
    async fn update_item(&self, update: ItemUpdate) -> Result<(), StoreError>;

    /// Delete an item. Deleting a missing item succeeds.
    async fn delete_item(&self, id: ItemId) -> Result<(), StoreError>;

    /// Every user with its changes ordered by change time ascending.
    async fn get_users_with_changes(&self) -> Result<Vec<UserHistory>, StoreError>;
}

#[async_trait::async_trait]
impl<S> InventoryStore for Arc<S>
where
    S: InventoryStore + ?Sized,
{
    async fn create_item(&self, item: NewItem) -> Result<Item, StoreError> {
        (**self).create_item(item).await
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        (**self).create_user(user).await
    }

    async fn get_all_items(&self) -> Result<Vec<Item>, StoreError> {
        (**self).get_all_items().await
    }

    async fn get_user_role(&self, id: UserId) -> Result<Role, StoreError> {
        (**self).get_user_role(id).await
    }

    async fn update_item(&self, update: ItemUpdate) -> Result<(), StoreError> {
        (**self).update_item(update).await
    }

    async fn delete_item(&self, id: ItemId) -> Result<(), StoreError> {
        (**self).delete_item(id).await
    }

    async fn get_users_with_changes(&self) -> Result<Vec<UserHistory>, StoreError> {
        (**self).get_users_with_changes().await
    }
}
