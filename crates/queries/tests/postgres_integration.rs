//! PostgreSQL integration tests for keyset and offset pagination.
//!
//! ```bash
//! cargo test -p queries --test postgres_integration
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use common::{AccountId, OrderId};
use queries::{QueryError, list_accounts, list_items, list_orders};
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use uuid::Uuid;

struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    base_url: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            Arc::new(ContainerInfo {
                container,
                base_url: format!("postgres://postgres:postgres@{}:{}", host, port),
            })
        })
        .await
        .clone()
}

/// Creates a fresh database with the schema applied.
async fn fresh_pool() -> PgPool {
    let info = get_container_info().await;

    let admin = PgPool::connect(&format!("{}/postgres", info.base_url))
        .await
        .unwrap();
    let name = format!("queries_{}", Uuid::new_v4().simple());
    sqlx::query(&format!("CREATE DATABASE {name}"))
        .execute(&admin)
        .await
        .unwrap();
    admin.close().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(4)
        .connect(&format!("{}/{}", info.base_url, name))
        .await
        .unwrap();

    sqlx::raw_sql(include_str!(
        "../../../migrations/001_create_order_tables.sql"
    ))
    .execute(&pool)
    .await
    .unwrap();

    pool
}

async fn insert_account(pool: &PgPool, email: &str) -> AccountId {
    let id: i64 =
        sqlx::query_scalar("INSERT INTO accounts (email, name) VALUES ($1, 'Buyer') RETURNING id")
            .bind(email)
            .fetch_one(pool)
            .await
            .unwrap();
    AccountId::new(id)
}

async fn insert_order(pool: &PgPool, account: AccountId, created_at: DateTime<Utc>) -> OrderId {
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO orders (account_id, number, status, total, created_at)
        VALUES ($1, $2, 'pending', 10.00, $3)
        RETURNING id
        "#,
    )
    .bind(account.as_i64())
    .bind(format!("ORD-{}", Uuid::new_v4().simple()))
    .bind(created_at)
    .fetch_one(pool)
    .await
    .unwrap();
    OrderId::new(id)
}

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

#[tokio::test]
async fn test_fifteen_orders_in_pages_of_ten() {
    let pool = fresh_pool().await;
    let account = insert_account(&pool, "pages@example.com").await;

    let mut inserted = Vec::new();
    for i in 0..15 {
        inserted.push(insert_order(&pool, account, base_time() + Duration::seconds(i)).await);
    }

    let first = list_orders(&pool, account, None, 10).await.unwrap();
    assert_eq!(first.items.len(), 10);
    assert!(first.has_more);
    let token = first.next_cursor.clone().expect("first page must carry a cursor");

    // Newest first
    assert_eq!(first.items[0].id, inserted[14]);
    assert_eq!(first.items[9].id, inserted[5]);

    let second = list_orders(&pool, account, Some(&token), 10).await.unwrap();
    assert_eq!(second.items.len(), 5);
    assert!(!second.has_more);
    assert!(second.next_cursor.is_none());
    assert_eq!(second.items[0].id, inserted[4]);
    assert_eq!(second.items[4].id, inserted[0]);

    let seen: HashSet<OrderId> = first
        .items
        .iter()
        .chain(second.items.iter())
        .map(|o| o.id)
        .collect();
    assert_eq!(seen.len(), 15);
}

#[tokio::test]
async fn test_equal_timestamps_break_ties_by_id() {
    let pool = fresh_pool().await;
    let account = insert_account(&pool, "ties@example.com").await;

    let mut inserted = Vec::new();
    for _ in 0..7 {
        inserted.push(insert_order(&pool, account, base_time()).await);
    }

    let mut collected = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
        let page = list_orders(&pool, account, cursor.as_deref(), 3).await.unwrap();
        collected.extend(page.items.iter().map(|o| o.id));
        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    inserted.reverse();
    assert_eq!(collected, inserted);
}

#[tokio::test]
async fn test_inserts_at_the_head_do_not_shift_later_pages() {
    let pool = fresh_pool().await;
    let account = insert_account(&pool, "shift@example.com").await;

    for i in 0..6 {
        insert_order(&pool, account, base_time() + Duration::seconds(i)).await;
    }

    let first = list_orders(&pool, account, None, 3).await.unwrap();
    let token = first.next_cursor.clone().unwrap();

    // A newer order arrives between page requests
    insert_order(&pool, account, base_time() + Duration::hours(1)).await;

    let second = list_orders(&pool, account, Some(&token), 3).await.unwrap();
    assert_eq!(second.items.len(), 3);
    for order in &second.items {
        assert!(!first.items.iter().any(|o| o.id == order.id));
        assert!(order.created_at < first.items[2].created_at);
    }
}

#[tokio::test]
async fn test_listing_is_scoped_to_the_account() {
    let pool = fresh_pool().await;
    let mine = insert_account(&pool, "mine@example.com").await;
    let theirs = insert_account(&pool, "theirs@example.com").await;

    insert_order(&pool, mine, base_time()).await;
    insert_order(&pool, theirs, base_time()).await;
    insert_order(&pool, theirs, base_time()).await;

    let page = list_orders(&pool, mine, None, 10).await.unwrap();
    assert_eq!(page.items.len(), 1);
    assert!(page.items.iter().all(|o| o.account_id == mine));

    let empty = list_orders(&pool, AccountId::new(999_999), None, 10)
        .await
        .unwrap();
    assert!(empty.items.is_empty());
    assert!(!empty.has_more);
}

#[tokio::test]
async fn test_invalid_cursor_is_rejected() {
    let pool = fresh_pool().await;
    let account = insert_account(&pool, "bad-cursor@example.com").await;

    let err = list_orders(&pool, account, Some("%%%"), 10)
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::InvalidCursor(_)));
}

#[tokio::test]
async fn test_offset_pages_of_items_and_accounts() {
    let pool = fresh_pool().await;

    for i in 0..5 {
        sqlx::query(
            "INSERT INTO items (sku, name, price, quantity, created_at) VALUES ($1, 'Item', 1.00, 3, $2)",
        )
        .bind(format!("SKU-{i}"))
        .bind(base_time() + Duration::seconds(i))
        .execute(&pool)
        .await
        .unwrap();
    }

    let page = list_items(&pool, 2, 2).await.unwrap();
    assert_eq!(page.total, 5);
    assert_eq!(page.page, 2);
    assert_eq!(page.page_size, 2);
    assert_eq!(page.total_pages, 3);
    let skus: Vec<&str> = page.items.iter().map(|i| i.sku.as_str()).collect();
    assert_eq!(skus, vec!["SKU-2", "SKU-1"]);

    let last = list_items(&pool, 3, 2).await.unwrap();
    assert_eq!(last.items.len(), 1);
    assert_eq!(last.items[0].sku, "SKU-0");

    let beyond = list_items(&pool, 9, 2).await.unwrap();
    assert!(beyond.items.is_empty());
    assert_eq!(beyond.total, 5);

    insert_account(&pool, "a@example.com").await;
    insert_account(&pool, "b@example.com").await;
    let accounts = list_accounts(&pool, 1, 10).await.unwrap();
    assert_eq!(accounts.total, 2);
    assert_eq!(accounts.items.len(), 2);
    assert_eq!(accounts.total_pages, 1);
}

#[tokio::test]
async fn test_zero_limit_pages_one_order_at_a_time() {
    let pool = fresh_pool().await;
    let account = insert_account(&pool, "zero@example.com").await;
    for i in 0..2 {
        insert_order(&pool, account, base_time() + Duration::seconds(i)).await;
    }

    let first = list_orders(&pool, account, None, 0).await.unwrap();
    assert_eq!(first.items.len(), 1);
    assert!(first.has_more);
    let token = first.next_cursor.expect("more orders remain");

    let second = list_orders(&pool, account, Some(&token), 0).await.unwrap();
    assert_eq!(second.items.len(), 1);
    assert!(!second.has_more);
    assert_ne!(first.items[0].id, second.items[0].id);
}
