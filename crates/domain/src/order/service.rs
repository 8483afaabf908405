//! Order assembly and order reads.

use std::time::Instant;

use common::OrderId;
use sqlx::PgConnection;
use store::{CancelSignal, PgStore, RetryPolicy, RetryingExecutor, TxOptions};

use super::model::{Order, OrderStatus};
use super::pricing::price_lines;
use super::repository::{fetch_order, insert_lines, insert_order, lock_next_pending, update_status};
use super::request::CreateOrder;
use crate::account::account_exists;
use crate::error::{DomainError, Result};
use crate::inventory::{LockPolicy, decrement_stock, lock_items};

/// Places an order inside the caller's transaction.
///
/// Locks the requested items fail-fast in ascending id order, prices the
/// lines, writes the order and its lines, takes the stock and reads the
/// order back. Any failure leaves the transaction to be rolled back.
pub async fn assemble_order(conn: &mut PgConnection, request: &CreateOrder) -> Result<Order> {
    if !account_exists(&mut *conn, request.account_id).await? {
        return Err(DomainError::AccountNotFound(request.account_id));
    }

    let lines = request.sorted_lines();
    let item_ids: Vec<_> = lines.iter().map(|l| l.item_id).collect();
    let items = lock_items(&mut *conn, &item_ids, LockPolicy::FailFast).await?;

    let (priced, total) = price_lines(&lines, &items)?;

    let order_id = insert_order(&mut *conn, request.account_id, total).await?;
    insert_lines(&mut *conn, order_id, &priced).await?;

    for line in &priced {
        decrement_stock(&mut *conn, line.item_id, line.quantity).await?;
    }

    fetch_order(conn, order_id).await
}

/// Order workflows.
#[derive(Debug, Clone)]
pub struct OrderService {
    executor: RetryingExecutor<PgStore>,
}

impl OrderService {
    /// Creates a service. Order assembly always runs at SERIALIZABLE.
    pub fn new(store: PgStore, policy: RetryPolicy) -> Self {
        Self {
            executor: RetryingExecutor::new(store, policy),
        }
    }

    /// Validates and places an order in one retried serializable
    /// transaction.
    ///
    /// Lock conflicts, deadlocks and serialization failures are retried
    /// under the service's policy. Missing rows and insufficient stock are
    /// returned as is on the first attempt that sees them.
    #[tracing::instrument(skip(self, request, cancel), fields(account_id = %request.account_id, lines = request.lines.len()))]
    pub async fn create_order(&self, request: CreateOrder, cancel: &CancelSignal) -> Result<Order> {
        request.validate()?;

        let start = Instant::now();
        let result = self
            .executor
            .run_with_retry(TxOptions::serializable(), cancel, |tx| {
                let request = request.clone();
                Box::pin(async move { assemble_order(&mut **tx, &request).await })
            })
            .await
            .map_err(DomainError::from);

        match &result {
            Ok(order) => {
                metrics::counter!("orders_created_total").increment(1);
                metrics::histogram!("order_create_duration_seconds")
                    .record(start.elapsed().as_secs_f64());
                tracing::info!(
                    order_id = %order.id,
                    number = %order.number,
                    total = %order.total,
                    "order created"
                );
            }
            Err(err) => {
                metrics::counter!("orders_rejected_total", "reason" => rejection_reason(err))
                    .increment(1);
                tracing::warn!(error = %err, "order rejected");
            }
        }

        result
    }

    /// Loads an order with its lines.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, id: OrderId) -> Result<Order> {
        let mut conn = self.executor.source().pool().acquire().await?;
        fetch_order(&mut conn, id).await
    }

    /// Claims the oldest pending order and marks it confirmed.
    ///
    /// Concurrent callers each claim a different order. Returns `None` when
    /// no pending order is available.
    #[tracing::instrument(skip(self, cancel))]
    pub async fn next_pending_order(&self, cancel: &CancelSignal) -> Result<Option<Order>> {
        self.executor
            .run_with_retry(TxOptions::default(), cancel, |tx| {
                Box::pin(async move {
                    let Some(id) = lock_next_pending(&mut **tx).await? else {
                        return Ok(None);
                    };
                    update_status(&mut **tx, id, OrderStatus::Confirmed).await?;
                    fetch_order(&mut **tx, id).await.map(Some)
                })
            })
            .await
            .map_err(DomainError::from)
    }
}

fn rejection_reason(err: &DomainError) -> &'static str {
    match err.root() {
        DomainError::AccountNotFound(_) | DomainError::ItemNotFound(_) => "not_found",
        DomainError::InsufficientStock { .. } => "insufficient_stock",
        DomainError::InvalidRequest(_) => "invalid_request",
        DomainError::LockUnavailable(_) => "lock_unavailable",
        DomainError::Cancelled => "cancelled",
        _ => "other",
    }
}
