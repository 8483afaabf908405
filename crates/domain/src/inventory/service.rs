use common::ItemId;
use store::{CancelSignal, PgStore, RetryPolicy, RetryingExecutor, TxOptions};

use super::item::{Item, NewItem, Revision, fetch_item, insert_item};
use super::locking::{
    LockPolicy, decrement_stock, lock_item, reserve_optimistic, update_quantity_optimistic,
};
use crate::error::{DomainError, Result};

/// Stock workflows. Each call owns exactly one retried transaction.
#[derive(Debug, Clone)]
pub struct InventoryService {
    executor: RetryingExecutor<PgStore>,
    options: TxOptions,
}

impl InventoryService {
    /// Creates a service running its transactions with `options`.
    pub fn new(store: PgStore, policy: RetryPolicy, options: TxOptions) -> Self {
        Self {
            executor: RetryingExecutor::new(store, policy),
            options,
        }
    }

    /// Adds an item to the catalog.
    #[tracing::instrument(skip(self, cancel), fields(sku = %item.sku))]
    pub async fn create_item(&self, item: NewItem, cancel: &CancelSignal) -> Result<Item> {
        item.validate()?;

        let created = self
            .executor
            .run_with_retry(self.options, cancel, |tx| {
                let item = item.clone();
                Box::pin(async move { insert_item(&mut **tx, &item).await })
            })
            .await
            .map_err(DomainError::from)?;

        tracing::info!(item_id = %created.id, quantity = created.quantity, "item created");
        Ok(created)
    }

    /// Reads an item without locking it.
    #[tracing::instrument(skip(self))]
    pub async fn get_item(&self, id: ItemId) -> Result<Item> {
        let mut conn = self.executor.source().pool().acquire().await?;
        fetch_item(&mut conn, id).await
    }

    /// Locks the item under `policy` and takes `quantity` units from it.
    #[tracing::instrument(skip(self, cancel))]
    pub async fn reserve(
        &self,
        id: ItemId,
        quantity: i32,
        policy: LockPolicy,
        cancel: &CancelSignal,
    ) -> Result<Item> {
        ensure_positive(quantity)?;

        let result = self
            .executor
            .run_with_retry(self.options, cancel, |tx| {
                Box::pin(async move {
                    let locked = lock_item(&mut **tx, id, policy).await?;
                    locked.ensure_available(quantity)?;
                    decrement_stock(&mut **tx, id, quantity).await
                })
            })
            .await
            .map_err(DomainError::from);

        record_reservation("locked", &result);
        result
    }

    /// Takes `quantity` units without locking, relying on the revision
    /// check. A concurrent change surfaces as
    /// [`DomainError::OptimisticConflict`].
    #[tracing::instrument(skip(self, cancel))]
    pub async fn reserve_optimistic(
        &self,
        id: ItemId,
        quantity: i32,
        cancel: &CancelSignal,
    ) -> Result<Item> {
        ensure_positive(quantity)?;

        let result = self
            .executor
            .run_with_retry(self.options, cancel, |tx| {
                Box::pin(async move { reserve_optimistic(&mut **tx, id, quantity).await })
            })
            .await
            .map_err(DomainError::from);

        record_reservation("optimistic", &result);
        result
    }

    /// Overwrites the on-hand quantity, e.g. after a restock, if the item is
    /// still at `expected`.
    #[tracing::instrument(skip(self, cancel))]
    pub async fn set_quantity_optimistic(
        &self,
        id: ItemId,
        expected: Revision,
        new_quantity: i32,
        cancel: &CancelSignal,
    ) -> Result<Item> {
        self.executor
            .run_with_retry(self.options, cancel, |tx| {
                Box::pin(async move {
                    update_quantity_optimistic(&mut **tx, id, expected, new_quantity).await
                })
            })
            .await
            .map_err(DomainError::from)
    }
}

fn ensure_positive(quantity: i32) -> Result<()> {
    if quantity <= 0 {
        return Err(DomainError::InvalidRequest(format!(
            "quantity must be positive: {quantity}"
        )));
    }
    Ok(())
}

fn record_reservation(strategy: &'static str, result: &Result<Item>) {
    let outcome = match result {
        Ok(_) => "reserved",
        Err(DomainError::InsufficientStock { .. }) => "insufficient_stock",
        Err(DomainError::OptimisticConflict { .. }) => "conflict",
        Err(_) => "failed",
    };
    metrics::counter!(
        "inventory_reservations_total",
        "strategy" => strategy,
        "outcome" => outcome
    )
    .increment(1);
}
