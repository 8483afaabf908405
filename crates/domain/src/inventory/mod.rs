//! Inventory items and the locking strategies that guard their stock.

mod item;
mod locking;
mod service;

pub use item::{ITEM_COLUMNS, Item, NewItem, Revision, fetch_item, insert_item, row_to_item};
pub use locking::{
    LockPolicy, decrement_stock, lock_first_available, lock_item, lock_items, reserve_optimistic,
    update_quantity_optimistic,
};
pub use service::InventoryService;
