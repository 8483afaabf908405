//! Order persistence. Every function runs inside its caller's transaction.

use chrono::Utc;
use common::{AccountId, ItemId, OrderId};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, Row};

use super::model::{Order, OrderLine, OrderStatus, generate_order_number};
use super::pricing::PricedLine;
use crate::error::{DomainError, Result};

const ORDER_COLUMNS: &str = "id, account_id, number, status, total, created_at";

fn row_to_order(row: &PgRow, lines: Vec<OrderLine>) -> Result<Order> {
    let status: String = row.try_get("status")?;
    let status = status
        .parse::<OrderStatus>()
        .map_err(|e| DomainError::Store(sqlx::Error::Decode(Box::new(e))))?;

    Ok(Order {
        id: OrderId::new(row.try_get("id")?),
        account_id: AccountId::new(row.try_get("account_id")?),
        number: row.try_get("number")?,
        status,
        total: row.try_get("total")?,
        created_at: row.try_get("created_at")?,
        lines,
    })
}

fn row_to_line(row: &PgRow) -> std::result::Result<OrderLine, sqlx::Error> {
    Ok(OrderLine {
        id: row.try_get("id")?,
        order_id: OrderId::new(row.try_get("order_id")?),
        item_id: ItemId::new(row.try_get("item_id")?),
        quantity: row.try_get("quantity")?,
        unit_price: row.try_get("unit_price")?,
        subtotal: row.try_get("subtotal")?,
    })
}

/// Inserts a pending order header and returns its id.
pub async fn insert_order(
    conn: &mut PgConnection,
    account_id: AccountId,
    total: Decimal,
) -> Result<OrderId> {
    let number = generate_order_number(Utc::now());

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO orders (account_id, number, status, total)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(account_id.as_i64())
    .bind(&number)
    .bind(OrderStatus::Pending.as_str())
    .bind(total)
    .fetch_one(conn)
    .await?;

    Ok(OrderId::new(id))
}

/// Inserts the lines of an order.
pub async fn insert_lines(
    conn: &mut PgConnection,
    order_id: OrderId,
    lines: &[PricedLine],
) -> Result<()> {
    for line in lines {
        sqlx::query(
            r#"
            INSERT INTO order_lines (order_id, item_id, quantity, unit_price, subtotal)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(order_id.as_i64())
        .bind(line.item_id.as_i64())
        .bind(line.quantity)
        .bind(line.unit_price)
        .bind(line.subtotal)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn fetch_lines(conn: &mut PgConnection, order_id: OrderId) -> Result<Vec<OrderLine>> {
    let rows = sqlx::query(
        r#"
        SELECT id, order_id, item_id, quantity, unit_price, subtotal
        FROM order_lines
        WHERE order_id = $1
        ORDER BY id
        "#,
    )
    .bind(order_id.as_i64())
    .fetch_all(conn)
    .await?;

    Ok(rows
        .iter()
        .map(row_to_line)
        .collect::<std::result::Result<_, _>>()?)
}

/// Loads an order with its lines.
pub async fn fetch_order(conn: &mut PgConnection, id: OrderId) -> Result<Order> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
    let row = sqlx::query(&sql)
        .bind(id.as_i64())
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(DomainError::OrderNotFound(id))?;

    let lines = fetch_lines(conn, id).await?;
    row_to_order(&row, lines)
}

/// Locks the oldest pending order no other transaction holds.
///
/// Rows locked by concurrent workers are skipped rather than waited on, so
/// each worker gets a different order. Returns `None` when nothing is left.
pub async fn lock_next_pending(conn: &mut PgConnection) -> Result<Option<OrderId>> {
    let id: Option<i64> = sqlx::query_scalar(
        r#"
        SELECT id
        FROM orders
        WHERE status = $1
        ORDER BY created_at, id
        LIMIT 1
        FOR UPDATE SKIP LOCKED
        "#,
    )
    .bind(OrderStatus::Pending.as_str())
    .fetch_optional(conn)
    .await?;

    Ok(id.map(OrderId::new))
}

/// Sets the status of an order.
pub async fn update_status(
    conn: &mut PgConnection,
    id: OrderId,
    status: OrderStatus,
) -> Result<()> {
    let result = sqlx::query("UPDATE orders SET status = $2 WHERE id = $1")
        .bind(id.as_i64())
        .bind(status.as_str())
        .execute(conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DomainError::OrderNotFound(id));
    }
    Ok(())
}
