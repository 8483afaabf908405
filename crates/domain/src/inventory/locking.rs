//! Row-level locking strategies over item rows.
//!
//! Every function here runs inside a transaction its caller owns. Each one
//! checks stock on the locked (or read) state before any mutation, so a
//! rejected request never decrements anything.

use common::ItemId;
use sqlx::PgConnection;
use store::sqlstate;

use super::item::{ITEM_COLUMNS, Item, Revision, fetch_item, item_exists, row_to_item};
use crate::error::{DomainError, Result};

/// How to wait for an item row held by another transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockPolicy {
    /// `FOR UPDATE`: wait until the holder commits or rolls back.
    #[default]
    Blocking,

    /// `FOR UPDATE NOWAIT`: fail with [`DomainError::LockUnavailable`].
    FailFast,
}

impl LockPolicy {
    fn clause(&self) -> &'static str {
        match self {
            LockPolicy::Blocking => "FOR UPDATE",
            LockPolicy::FailFast => "FOR UPDATE NOWAIT",
        }
    }
}

fn is_lock_not_available(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(sqlstate::LOCK_NOT_AVAILABLE)
    )
}

/// Locks one item row under `policy` and returns its current state.
pub async fn lock_item(conn: &mut PgConnection, id: ItemId, policy: LockPolicy) -> Result<Item> {
    let sql = format!(
        "SELECT {ITEM_COLUMNS} FROM items WHERE id = $1 {}",
        policy.clause()
    );

    let row = sqlx::query(&sql)
        .bind(id.as_i64())
        .fetch_optional(conn)
        .await
        .map_err(|e| {
            if is_lock_not_available(&e) {
                tracing::debug!(item_id = %id, "item row is locked");
                DomainError::LockUnavailable(id)
            } else {
                DomainError::Store(e)
            }
        })?
        .ok_or(DomainError::ItemNotFound(id))?;

    Ok(row_to_item(&row)?)
}

/// Locks several item rows one at a time in ascending id order.
///
/// A fixed acquisition order keeps two transactions locking overlapping sets
/// from waiting on each other in a cycle.
pub async fn lock_items(
    conn: &mut PgConnection,
    ids: &[ItemId],
    policy: LockPolicy,
) -> Result<Vec<Item>> {
    let mut ordered = ids.to_vec();
    ordered.sort_unstable();
    ordered.dedup();

    let mut items = Vec::with_capacity(ordered.len());
    for id in ordered {
        items.push(lock_item(conn, id, policy).await?);
    }
    Ok(items)
}

/// Locks the oldest candidate that no other transaction holds, skipping
/// locked rows instead of waiting for them.
///
/// Returns `None` when every candidate is missing or locked. The chosen row
/// must hold `requested` units, else [`DomainError::InsufficientStock`].
pub async fn lock_first_available(
    conn: &mut PgConnection,
    candidates: &[ItemId],
    requested: i32,
) -> Result<Option<Item>> {
    if candidates.is_empty() {
        return Ok(None);
    }

    let ids: Vec<i64> = candidates.iter().map(ItemId::as_i64).collect();
    let sql = format!(
        r#"
        SELECT {ITEM_COLUMNS}
        FROM items
        WHERE id = ANY($1)
        ORDER BY created_at, id
        LIMIT 1
        FOR UPDATE SKIP LOCKED
        "#
    );

    let Some(row) = sqlx::query(&sql).bind(&ids).fetch_optional(conn).await? else {
        return Ok(None);
    };

    let item = row_to_item(&row)?;
    item.ensure_available(requested)?;
    Ok(Some(item))
}

/// Takes `quantity` units from a row, guarded by `quantity >= requested` in
/// the statement itself. Bumps the revision.
///
/// The guard makes the decrement safe even without a prior lock; when it
/// matches nothing, the row is probed to report either
/// [`DomainError::ItemNotFound`] or [`DomainError::InsufficientStock`].
pub async fn decrement_stock(conn: &mut PgConnection, id: ItemId, quantity: i32) -> Result<Item> {
    if quantity <= 0 {
        return Err(DomainError::InvalidRequest(format!(
            "quantity must be positive: {quantity}"
        )));
    }

    let sql = format!(
        r#"
        UPDATE items
        SET quantity = quantity - $2,
            revision = revision + 1,
            updated_at = NOW()
        WHERE id = $1 AND quantity >= $2
        RETURNING {ITEM_COLUMNS}
        "#
    );

    let row = sqlx::query(&sql)
        .bind(id.as_i64())
        .bind(quantity)
        .fetch_optional(&mut *conn)
        .await?;

    match row {
        Some(row) => Ok(row_to_item(&row)?),
        None => {
            let current = fetch_item(conn, id).await?;
            Err(DomainError::InsufficientStock {
                item_id: id,
                requested: quantity,
                available: current.quantity,
            })
        }
    }
}

/// Sets the on-hand quantity if the row is still at `expected`.
///
/// No lock is taken. A revision mismatch is
/// [`DomainError::OptimisticConflict`] and leaves the row unchanged.
pub async fn update_quantity_optimistic(
    conn: &mut PgConnection,
    id: ItemId,
    expected: Revision,
    new_quantity: i32,
) -> Result<Item> {
    if new_quantity < 0 {
        return Err(DomainError::InvalidRequest(format!(
            "quantity must not be negative: {new_quantity}"
        )));
    }

    let sql = format!(
        r#"
        UPDATE items
        SET quantity = $3,
            revision = revision + 1,
            updated_at = NOW()
        WHERE id = $1 AND revision = $2
        RETURNING {ITEM_COLUMNS}
        "#
    );

    let row = sqlx::query(&sql)
        .bind(id.as_i64())
        .bind(expected.as_i64())
        .bind(new_quantity)
        .fetch_optional(&mut *conn)
        .await?;

    if let Some(row) = row {
        return Ok(row_to_item(&row)?);
    }

    if item_exists(conn, id).await? {
        Err(DomainError::OptimisticConflict {
            item_id: id,
            expected,
        })
    } else {
        Err(DomainError::ItemNotFound(id))
    }
}

/// Reads the row, checks stock, then writes the reduced quantity back
/// against the revision it read.
pub async fn reserve_optimistic(
    conn: &mut PgConnection,
    id: ItemId,
    quantity: i32,
) -> Result<Item> {
    if quantity <= 0 {
        return Err(DomainError::InvalidRequest(format!(
            "quantity must be positive: {quantity}"
        )));
    }

    let item = fetch_item(&mut *conn, id).await?;
    item.ensure_available(quantity)?;
    update_quantity_optimistic(conn, id, item.revision, item.quantity - quantity).await
}
