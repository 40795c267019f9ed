use std::collections::BTreeMap;
use std::sync::RwLock;

use chrono::Utc;

use warehouse_auth::Role;
use warehouse_core::{ItemId, UserId};
use warehouse_inventory::{Change, Item, ItemUpdate, NewItem, NewUser, User, UserHistory};

use super::{InventoryStore, StoreError};

#[derive(Debug, Clone)]
struct HistoryRow {
    changed_by: UserId,
    change: Change,
}

#[derive(Debug, Default)]
struct State {
    last_item_id: i64,
    last_user_id: i64,
    items: BTreeMap<ItemId, Item>,
    users: BTreeMap<UserId, User>,
    history: Vec<HistoryRow>,
}

/// In-memory inventory store.
///
/// Intended for tests/dev. Mirrors the Postgres schema rules: ids are
/// monotonic and never reused, blank names and negative counts are rejected,
/// changes must be attributed to an existing user, and deleting an item drops
/// its change records.
#[derive(Debug, Default)]
pub struct InMemoryInventoryStore {
    state: RwLock<State>,
}

impl InMemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, State>, StoreError> {
        self.state
            .read()
            .map_err(|_| StoreError::Database("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, State>, StoreError> {
        self.state
            .write()
            .map_err(|_| StoreError::Database("lock poisoned".to_string()))
    }
}

fn check_name(name: &str) -> Result<(), StoreError> {
    if name.trim().is_empty() {
        return Err(StoreError::ConstraintViolation("name must not be empty".to_string()));
    }
    Ok(())
}

fn check_count(count: i64) -> Result<(), StoreError> {
    if count < 0 {
        return Err(StoreError::ConstraintViolation("count must not be negative".to_string()));
    }
    Ok(())
}

#[async_trait::async_trait]
impl InventoryStore for InMemoryInventoryStore {
    async fn create_item(&self, item: NewItem) -> Result<Item, StoreError> {
        check_name(&item.name)?;
        check_count(item.count)?;

        let mut state = self.write()?;
        state.last_item_id += 1;
        let created = Item {
            id: ItemId::new(state.last_item_id),
            name: item.name,
            count: item.count,
            created_at: Utc::now(),
        };
        state.items.insert(created.id, created.clone());
        Ok(created)
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        check_name(&user.name)?;

        let mut state = self.write()?;
        state.last_user_id += 1;
        let created = User {
            id: UserId::new(state.last_user_id),
            name: user.name,
            role: user.role,
            created_at: Utc::now(),
            token: None,
        };
        state.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_all_items(&self) -> Result<Vec<Item>, StoreError> {
        Ok(self.read()?.items.values().cloned().collect())
    }

    async fn get_user_role(&self, id: UserId) -> Result<Role, StoreError> {
        self.read()?
            .users
            .get(&id)
            .map(|u| u.role)
            .ok_or_else(|| StoreError::NotFound(format!("user {id}")))
    }

    async fn update_item(&self, update: ItemUpdate) -> Result<(), StoreError> {
        let mut state = self.write()?;

        // Work on a copy so a rejected update leaves no trace.
        let mut item = state
            .items
            .get(&update.id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("item {}", update.id)))?;

        if let Some(name) = &update.name {
            check_name(name)?;
        }
        if let Some(count) = update.count {
            check_count(count)?;
        }

        let changed = update.apply_to(&mut item);
        if changed.is_empty() {
            return Ok(());
        }
        if !state.users.contains_key(&update.acting_user_id) {
            return Err(StoreError::ConstraintViolation(format!(
                "change attributed to unknown user {}",
                update.acting_user_id
            )));
        }

        let change_time = Utc::now();
        for (column, previous) in changed {
            state.history.push(HistoryRow {
                changed_by: update.acting_user_id,
                change: Change {
                    item_id: item.id,
                    changed_column: column.as_str().to_string(),
                    changed_from: previous,
                    change_time,
                },
            });
        }
        state.items.insert(item.id, item);
        Ok(())
    }

    async fn delete_item(&self, id: ItemId) -> Result<(), StoreError> {
        let mut state = self.write()?;
        if state.items.remove(&id).is_some() {
            state.history.retain(|row| row.change.item_id != id);
        }
        Ok(())
    }

    async fn get_users_with_changes(&self) -> Result<Vec<UserHistory>, StoreError> {
        let state = self.read()?;

        Ok(state
            .users
            .values()
            .map(|user| {
                let changes = state
                    .history
                    .iter()
                    .filter(|row| row.changed_by == user.id)
                    .map(|row| row.change.clone())
                    .collect();
                UserHistory::new(user.clone(), changes)
            })
            .collect())
    }
}
