//! Keyset listing of an account's orders, newest first.

use chrono::{DateTime, Utc};
use common::{AccountId, OrderId};
use domain::OrderStatus;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::cursor::{self, Position};
use crate::error::{QueryError, Result};
use crate::page::CursorPage;

/// An order header as shown in listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderSummary {
    pub id: OrderId,
    pub account_id: AccountId,
    pub number: String,
    pub status: OrderStatus,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
}

impl OrderSummary {
    /// The keyset position of this row.
    pub fn position(&self) -> Position {
        Position::new(self.created_at, self.id.as_i64())
    }
}

fn row_to_summary(row: &PgRow) -> Result<OrderSummary> {
    let status: String = row.try_get("status")?;
    let status = status
        .parse::<OrderStatus>()
        .map_err(|e| QueryError::CorruptRow(e.to_string()))?;

    Ok(OrderSummary {
        id: OrderId::new(row.try_get("id")?),
        account_id: AccountId::new(row.try_get("account_id")?),
        number: row.try_get("number")?,
        status,
        total: row.try_get("total")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Lists an account's orders in `(created_at DESC, id DESC)` order,
/// resuming after `cursor`.
///
/// Each page costs one index range scan regardless of depth. Orders
/// inserted after a page was served sort before it and never shift later
/// pages. A zero `limit` is read as 1.
#[tracing::instrument(skip(pool, cursor))]
pub async fn list_orders(
    pool: &PgPool,
    account_id: AccountId,
    cursor: Option<&str>,
    limit: u32,
) -> Result<CursorPage<OrderSummary>> {
    let limit = limit.max(1);
    let position = cursor::decode_or_start(cursor)?;
    let fetch = i64::from(limit) + 1;

    let rows = if position.is_start() {
        sqlx::query(
            r#"
            SELECT id, account_id, number, status, total, created_at
            FROM orders
            WHERE account_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(account_id.as_i64())
        .bind(fetch)
        .fetch_all(pool)
        .await?
    } else {
        sqlx::query(
            r#"
            SELECT id, account_id, number, status, total, created_at
            FROM orders
            WHERE account_id = $1
              AND (created_at, id) < ($2, $3)
            ORDER BY created_at DESC, id DESC
            LIMIT $4
            "#,
        )
        .bind(account_id.as_i64())
        .bind(position.key())
        .bind(position.id())
        .bind(fetch)
        .fetch_all(pool)
        .await?
    };

    let summaries = rows
        .iter()
        .map(row_to_summary)
        .collect::<Result<Vec<_>>>()?;

    Ok(CursorPage::from_overfetch(summaries, limit, OrderSummary::position))
}
