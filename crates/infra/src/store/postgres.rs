//! Postgres-backed inventory store.
//!
//! The change log is written by the `log_item_changes` trigger (see
//! `migrations/`), never by this module. `update_item` only tells the trigger
//! who is acting, through the transaction-local `app.current_user_id` setting.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (not null / FK / unique / check) | `23502`, `23503`, `23505`, `23514` | `ConstraintViolation` |
//! | Database (other) | Any other | `Database` |
//! | RowNotFound | N/A | `NotFound` |
//! | Other | N/A | `Database` |

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Row};
use tracing::{Span, instrument};

use warehouse_auth::Role;
use warehouse_core::{ItemId, UserId};
use warehouse_inventory::{Change, Item, ItemUpdate, NewItem, NewUser, User, UserHistory};

use super::{InventoryStore, StoreError};

/// Production inventory store over a bounded `PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresInventoryStore {
    pool: Arc<PgPool>,
}

impl PostgresInventoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait::async_trait]
impl InventoryStore for PostgresInventoryStore {
    #[instrument(skip(self, item), fields(name = %item.name, count = item.count, item_id), err)]
    async fn create_item(&self, item: NewItem) -> Result<Item, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO items (name, count)
            VALUES ($1, $2)
            RETURNING id, name, count, created_at
            "#,
        )
        .bind(&item.name)
        .bind(item.count)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_item", e))?;

        let item = ItemRow::from_row(&row).map_err(|e| map_sqlx_error("create_item", e))?;
        Span::current().record("item_id", item.id);
        Ok(item.into())
    }

    #[instrument(skip(self, user), fields(name = %user.name, role = %user.role), err)]
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (name, role)
            VALUES ($1, $2)
            RETURNING id, name, role, created_at
            "#,
        )
        .bind(&user.name)
        .bind(user.role.as_str())
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_user", e))?;

        UserRow::from_row(&row)
            .map_err(|e| map_sqlx_error("create_user", e))?
            .try_into()
    }

    #[instrument(skip(self), fields(item_count), err)]
    async fn get_all_items(&self) -> Result<Vec<Item>, StoreError> {
        let rows = sqlx::query("SELECT id, name, count, created_at FROM items")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_all_items", e))?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            let item = ItemRow::from_row(&row).map_err(|e| map_sqlx_error("get_all_items", e))?;
            items.push(item.into());
        }

        Span::current().record("item_count", items.len());
        Ok(items)
    }

    #[instrument(skip(self), fields(user_id = %id), err)]
    async fn get_user_role(&self, id: UserId) -> Result<Role, StoreError> {
        let role: Option<String> = sqlx::query_scalar("SELECT role FROM users WHERE id = $1")
            .bind(id.get())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_user_role", e))?;

        match role {
            Some(role) => parse_role(&role),
            None => Err(StoreError::NotFound(format!("user {id}"))),
        }
    }

    #[instrument(
        skip(self, update),
        fields(item_id = %update.id, acting_user_id = %update.acting_user_id),
        err
    )]
    async fn update_item(&self, update: ItemUpdate) -> Result<(), StoreError> {
        // Dropping `tx` without commit rolls back.
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("update_item.begin", e))?;

        sqlx::query("SELECT set_config('app.current_user_id', $1, true)")
            .bind(update.acting_user_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("update_item.set_actor", e))?;

        let result = sqlx::query(
            r#"
            UPDATE items SET
                name = COALESCE($1, name),
                count = COALESCE($2, count)
            WHERE id = $3
            "#,
        )
        .bind(update.name.as_deref())
        .bind(update.count)
        .bind(update.id.get())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_item", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("item {}", update.id)));
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("update_item.commit", e))
    }

    #[instrument(skip(self), fields(item_id = %id), err)]
    async fn delete_item(&self, id: ItemId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id.get())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_item", e))?;
        Ok(())
    }

    /// Single aggregation over all users and their changes; not paginated.
    #[instrument(skip(self), fields(user_count), err)]
    async fn get_users_with_changes(&self) -> Result<Vec<UserHistory>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT
                u.id,
                u.name,
                u.role,
                u.created_at,
                COALESCE(
                    JSON_AGG(
                        JSON_BUILD_OBJECT(
                            'item_id', ih.item_id,
                            'changed_column', ih.changed_column,
                            'changed_from', ih.changed_from,
                            'change_time', ih.change_time
                        )
                        ORDER BY ih.change_time, ih.id
                    ) FILTER (WHERE ih.id IS NOT NULL),
                    '[]'
                ) AS history
            FROM users u
            LEFT JOIN items_history ih ON ih.changed_by_id = u.id
            GROUP BY u.id, u.name, u.role, u.created_at
            ORDER BY u.id
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_users_with_changes", e))?;

        let mut users = Vec::with_capacity(rows.len());
        for row in rows {
            let user: User = UserRow::from_row(&row)
                .map_err(|e| map_sqlx_error("get_users_with_changes", e))?
                .try_into()?;
            let Json(history): Json<Vec<Change>> = row
                .try_get("history")
                .map_err(|e| map_sqlx_error("get_users_with_changes", e))?;
            users.push(UserHistory::new(user, history));
        }

        Span::current().record("user_count", users.len());
        Ok(users)
    }
}

struct ItemRow {
    id: i64,
    name: String,
    count: i64,
    created_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for ItemRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(ItemRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            count: row.try_get("count")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl From<ItemRow> for Item {
    fn from(row: ItemRow) -> Self {
        Item {
            id: ItemId::new(row.id),
            name: row.name,
            count: row.count,
            created_at: row.created_at,
        }
    }
}

struct UserRow {
    id: i64,
    name: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for UserRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(UserRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            role: row.try_get("role")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: UserId::new(row.id),
            name: row.name,
            role: parse_role(&row.role)?,
            created_at: row.created_at,
            token: None,
        })
    }
}

fn parse_role(raw: &str) -> Result<Role, StoreError> {
    raw.parse()
        .map_err(|e| StoreError::Database(format!("corrupt users.role: {e}")))
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());

            match db_err.code().as_deref() {
                Some("23502" | "23503" | "23505" | "23514") => StoreError::ConstraintViolation(msg),
                _ => StoreError::Database(msg),
            }
        }
        sqlx::Error::RowNotFound => StoreError::NotFound(format!("no row in {operation}")),
        sqlx::Error::PoolClosed => {
            StoreError::Database(format!("connection pool closed in {operation}"))
        }
        _ => StoreError::Database(format!("sqlx error in {operation}: {err}")),
    }
}
