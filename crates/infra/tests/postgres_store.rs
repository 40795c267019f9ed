//! Postgres store tests.
//!
//! Run only when `TEST_DATABASE_URL` points at a disposable database; the
//! tables are truncated. Scenarios run sequentially inside one test because
//! they share the schema.

use std::time::Duration;

use sqlx::PgPool;
use tokio::task::JoinSet;

use warehouse_auth::Role;
use warehouse_core::{ItemId, UserId};
use warehouse_infra::{InventoryStore, PostgresInventoryStore, StoreError, run_migrations};
use warehouse_inventory::{ItemUpdate, NewItem, NewUser};

async fn fresh_store() -> Option<(PostgresInventoryStore, PgPool)> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;
    let pool = PgPool::connect(&url).await.expect("connect to TEST_DATABASE_URL");
    run_migrations(&pool).await.expect("migrations");
    reset(&pool).await;
    Some((PostgresInventoryStore::new(pool.clone()), pool))
}

async fn reset(pool: &PgPool) {
    sqlx::query("TRUNCATE items_history, items, users RESTART IDENTITY CASCADE")
        .execute(pool)
        .await
        .expect("truncate");
}

async fn row_count(pool: &PgPool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .expect("count")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn postgres_store_scenarios() {
    let Some((store, pool)) = fresh_store().await else {
        eprintln!("TEST_DATABASE_URL not set; skipping postgres store tests");
        return;
    };

    count_only_update_logs_one_change(&store).await;
    reset(&pool).await;

    update_of_missing_item_changes_nothing(&store, &pool).await;
    reset(&pool).await;

    user_without_changes_has_empty_history(&store).await;
    reset(&pool).await;

    empty_name_is_a_constraint_violation(&store).await;
    reset(&pool).await;

    unknown_actor_rolls_back(&store, &pool).await;
    reset(&pool).await;

    delete_is_idempotent_and_cascades_history(&store, &pool).await;
    reset(&pool).await;

    concurrent_updates_keep_their_own_actor(&store).await;
    reset(&pool).await;

    cancelled_update_is_all_or_nothing(&store, &pool).await;
}

async fn count_only_update_logs_one_change(store: &PostgresInventoryStore) {
    let user = store.create_user(NewUser::new("mo", Role::Manager)).await.unwrap();
    let item = store.create_item(NewItem::new("bolt", 5)).await.unwrap();

    store
        .update_item(ItemUpdate::new(item.id, user.id).with_count(9))
        .await
        .unwrap();

    let items = store.get_all_items().await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].name, "bolt");
    assert_eq!(items[0].count, 9);

    let history = store.get_users_with_changes().await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].role, Role::Manager);
    assert_eq!(history[0].history.len(), 1);
    assert_eq!(history[0].history[0].changed_column, "count");
    assert_eq!(history[0].history[0].changed_from, "5");
    assert_eq!(history[0].history[0].item_id, item.id);

    // Same values again: no new change rows.
    store
        .update_item(ItemUpdate::new(item.id, user.id).with_count(9).with_name("bolt"))
        .await
        .unwrap();
    assert_eq!(store.get_users_with_changes().await.unwrap()[0].history.len(), 1);
}

async fn update_of_missing_item_changes_nothing(store: &PostgresInventoryStore, pool: &PgPool) {
    let err = store
        .update_item(ItemUpdate::new(ItemId::new(9999), UserId::new(1)).with_name("x"))
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::NotFound(_)), "got {err:?}");
    assert_eq!(row_count(pool, "items").await, 0);
    assert_eq!(row_count(pool, "items_history").await, 0);
}

async fn user_without_changes_has_empty_history(store: &PostgresInventoryStore) {
    let user = store.create_user(NewUser::new("vi", Role::Viewer)).await.unwrap();

    let history = store.get_users_with_changes().await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, user.id);
    assert!(history[0].history.is_empty());
    assert_eq!(store.get_user_role(user.id).await.unwrap(), Role::Viewer);
}

async fn empty_name_is_a_constraint_violation(store: &PostgresInventoryStore) {
    let err = store.create_item(NewItem::new("", 1)).await.unwrap_err();
    assert!(matches!(err, StoreError::ConstraintViolation(_)), "got {err:?}");
    assert!(store.get_all_items().await.unwrap().is_empty());
}

async fn unknown_actor_rolls_back(store: &PostgresInventoryStore, pool: &PgPool) {
    let item = store.create_item(NewItem::new("bolt", 5)).await.unwrap();

    let err = store
        .update_item(ItemUpdate::new(item.id, UserId::new(4242)).with_name("nut"))
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::ConstraintViolation(_)), "got {err:?}");
    assert_eq!(store.get_all_items().await.unwrap()[0].name, "bolt");
    assert_eq!(row_count(pool, "items_history").await, 0);
}

async fn delete_is_idempotent_and_cascades_history(store: &PostgresInventoryStore, pool: &PgPool) {
    let user = store.create_user(NewUser::new("ann", Role::Admin)).await.unwrap();
    let item = store.create_item(NewItem::new("bolt", 5)).await.unwrap();
    store
        .update_item(ItemUpdate::new(item.id, user.id).with_name("nut"))
        .await
        .unwrap();

    store.delete_item(item.id).await.unwrap();
    store.delete_item(item.id).await.unwrap();

    assert!(store.get_all_items().await.unwrap().is_empty());
    assert_eq!(row_count(pool, "items_history").await, 0);
}

async fn concurrent_updates_keep_their_own_actor(store: &PostgresInventoryStore) {
    const ROUNDS: i64 = 20;

    let ann = store.create_user(NewUser::new("ann", Role::Admin)).await.unwrap();
    let mo = store.create_user(NewUser::new("mo", Role::Manager)).await.unwrap();
    let ann_item = store.create_item(NewItem::new("bolt", 0)).await.unwrap();
    let mo_item = store.create_item(NewItem::new("nut", 0)).await.unwrap();

    let mut tasks = JoinSet::new();
    for round in 1..=ROUNDS {
        for (actor, item) in [(ann.id, ann_item.id), (mo.id, mo_item.id)] {
            let store = store.clone();
            tasks.spawn(async move {
                store
                    .update_item(ItemUpdate::new(item, actor).with_count(round))
                    .await
            });
        }
    }
    while let Some(joined) = tasks.join_next().await {
        joined.expect("update task panicked").expect("update failed");
    }

    let history = store.get_users_with_changes().await.unwrap();
    let mut total = 0;
    for user in &history {
        let own_item = if user.id == ann.id { ann_item.id } else { mo_item.id };
        for change in &user.history {
            assert_eq!(change.item_id, own_item, "change misattributed to user {}", user.id);
        }
        total += user.history.len();
    }
    // Each round writes a distinct count, so every update logs exactly one row.
    assert_eq!(total as i64, 2 * ROUNDS);
}

async fn cancelled_update_is_all_or_nothing(store: &PostgresInventoryStore, pool: &PgPool) {
    let user = store.create_user(NewUser::new("ann", Role::Admin)).await.unwrap();
    let item = store.create_item(NewItem::new("bolt", 5)).await.unwrap();

    // The future may be dropped at any await point inside the transaction.
    let _ = tokio::time::timeout(
        Duration::from_micros(50),
        store.update_item(ItemUpdate::new(item.id, user.id).with_name("nut").with_count(6)),
    )
    .await;
    // Let the pool finish rolling back a connection returned mid-transaction.
    tokio::time::sleep(Duration::from_millis(200)).await;

    let current = store.get_all_items().await.unwrap().remove(0);
    let logged = row_count(pool, "items_history").await;
    if current.name == "nut" {
        assert_eq!(current.count, 6);
        assert_eq!(logged, 2);
    } else {
        assert_eq!((current.name.as_str(), current.count), ("bolt", 5));
        assert_eq!(logged, 0);
    }
}
