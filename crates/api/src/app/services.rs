//! Application service: the seam between HTTP handlers and the inventory store.

use std::sync::Arc;

use thiserror::Error;

use warehouse_auth::Role;
use warehouse_core::{DomainError, ItemId, UserId};
use warehouse_infra::{DbInitError, InMemoryInventoryStore, InventoryStore, PostgresInventoryStore, StoreError};
use warehouse_inventory::{Item, ItemUpdate, NewItem, NewUser, User, UserHistory};

use crate::config::{AppConfig, StoreKind};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("acting user {0} does not exist")]
    UnknownActor(UserId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Operations the HTTP layer may invoke.
#[async_trait::async_trait]
pub trait InventoryService: Send + Sync {
    async fn create_item(&self, item: NewItem) -> Result<Item, ServiceError>;

    async fn create_user(&self, user: NewUser) -> Result<User, ServiceError>;

    async fn get_all_items(&self) -> Result<Vec<Item>, ServiceError>;

    async fn get_user_role(&self, id: UserId) -> Result<Role, ServiceError>;

    async fn update_item(&self, update: ItemUpdate) -> Result<(), ServiceError>;

    async fn delete_item(&self, id: ItemId) -> Result<(), ServiceError>;

    async fn get_users_with_changes(&self) -> Result<Vec<UserHistory>, ServiceError>;
}

/// Store-backed service. Validates domain input before it reaches the store.
#[derive(Debug)]
pub struct AppService<S> {
    store: S,
}

impl<S: InventoryStore> AppService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl<S: InventoryStore> InventoryService for AppService<S> {
    async fn create_item(&self, item: NewItem) -> Result<Item, ServiceError> {
        item.validate()?;
        Ok(self.store.create_item(item).await?)
    }

    async fn create_user(&self, user: NewUser) -> Result<User, ServiceError> {
        user.validate()?;
        Ok(self.store.create_user(user).await?)
    }

    async fn get_all_items(&self) -> Result<Vec<Item>, ServiceError> {
        Ok(self.store.get_all_items().await?)
    }

    async fn get_user_role(&self, id: UserId) -> Result<Role, ServiceError> {
        Ok(self.store.get_user_role(id).await?)
    }

    async fn update_item(&self, update: ItemUpdate) -> Result<(), ServiceError> {
        update.validate()?;

        match self.store.get_user_role(update.acting_user_id).await {
            Ok(_) => {}
            Err(StoreError::NotFound(_)) => return Err(ServiceError::UnknownActor(update.acting_user_id)),
            Err(e) => return Err(e.into()),
        }

        Ok(self.store.update_item(update).await?)
    }

    async fn delete_item(&self, id: ItemId) -> Result<(), ServiceError> {
        Ok(self.store.delete_item(id).await?)
    }

    async fn get_users_with_changes(&self) -> Result<Vec<UserHistory>, ServiceError> {
        Ok(self.store.get_users_with_changes().await?)
    }
}

/// Build the service over the configured store.
pub async fn build_service(config: &AppConfig) -> Result<Arc<dyn InventoryService>, DbInitError> {
    match config.store {
        StoreKind::Postgres => {
            let pool = config.database.connect().await?;
            Ok(Arc::new(AppService::new(PostgresInventoryStore::new(pool))))
        }
        StoreKind::Memory => {
            tracing::warn!("using in-memory store; state will not survive restarts");
            Ok(Arc::new(AppService::new(InMemoryInventoryStore::new())))
        }
    }
}
