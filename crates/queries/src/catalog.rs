//! Offset listings of items and accounts.

use domain::account::row_to_account;
use domain::inventory::{ITEM_COLUMNS, row_to_item};
use domain::{Account, Item};
use sqlx::PgPool;

use crate::error::Result;
use crate::page::{OffsetPage, offset_of};

/// Lists items newest first, one numbered page at a time.
#[tracing::instrument(skip(pool))]
pub async fn list_items(pool: &PgPool, page: u32, page_size: u32) -> Result<OffsetPage<Item>> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
        .fetch_one(pool)
        .await?;

    let sql = format!(
        r#"
        SELECT {ITEM_COLUMNS}
        FROM items
        ORDER BY created_at DESC, id DESC
        LIMIT $1 OFFSET $2
        "#
    );
    let rows = sqlx::query(&sql)
        .bind(i64::from(page_size))
        .bind(offset_of(page, page_size))
        .fetch_all(pool)
        .await?;

    let items = rows
        .iter()
        .map(row_to_item)
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(OffsetPage::new(items, total, page.max(1), page_size))
}

/// Lists accounts newest first, one numbered page at a time.
#[tracing::instrument(skip(pool))]
pub async fn list_accounts(
    pool: &PgPool,
    page: u32,
    page_size: u32,
) -> Result<OffsetPage<Account>> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts")
        .fetch_one(pool)
        .await?;

    let rows = sqlx::query(
        r#"
        SELECT id, email, name, created_at
        FROM accounts
        ORDER BY created_at DESC, id DESC
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(i64::from(page_size))
    .bind(offset_of(page, page_size))
    .fetch_all(pool)
    .await?;

    let accounts = rows
        .iter()
        .map(row_to_account)
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(OffsetPage::new(accounts, total, page.max(1), page_size))
}
