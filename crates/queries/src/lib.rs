//! Read paths for the order-processing engine.
//!
//! - [`cursor`] encodes and decodes opaque keyset positions
//! - [`list_orders`] pages through an account's orders by keyset, so deep
//!   pages cost the same as the first and concurrent inserts never shift them
//! - [`list_items`] and [`list_accounts`] are classic numbered pages
//!
//! Reads run directly against the pool; none of them take locks.

pub mod catalog;
pub mod cursor;
pub mod error;
pub mod orders;
pub mod page;

pub use catalog::{list_accounts, list_items};
pub use cursor::{CursorError, Position};
pub use error::{QueryError, Result};
pub use orders::{OrderSummary, list_orders};
pub use page::{CursorPage, OffsetPage, PageLimits};
