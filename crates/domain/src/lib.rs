//! Domain layer for the order-processing engine.
//!
//! This crate provides:
//! - Accounts, the buyers orders belong to
//! - Inventory items and the row-locking strategies that keep stock
//!   non-negative under concurrent reservations
//! - Order assembly: validate, lock, price, persist and decrement inside one
//!   retried serializable transaction
//!
//! Functions taking a `&mut PgConnection` run inside a transaction owned by
//! their caller. The `*Service` types own transaction lifecycle.

pub mod account;
pub mod error;
pub mod inventory;
pub mod order;

pub use account::{Account, AccountService, NewAccount};
pub use error::{DomainError, Result};
pub use inventory::{InventoryService, Item, LockPolicy, NewItem, Revision};
pub use order::{CreateOrder, LineRequest, Order, OrderLine, OrderService, OrderStatus};
