//! Orders: request validation, pricing, persistence and assembly.

mod model;
mod pricing;
mod repository;
mod request;
mod service;

pub use model::{Order, OrderLine, OrderStatus, ParseOrderStatusError, generate_order_number};
pub use pricing::{PricedLine, line_subtotal, price_lines};
pub use repository::{fetch_order, insert_lines, insert_order, lock_next_pending, update_status};
pub use request::{CreateOrder, LineRequest};
pub use service::{OrderService, assemble_order};
