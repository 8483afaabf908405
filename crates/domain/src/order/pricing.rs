//! Exact decimal pricing of order lines.

use common::ItemId;
use rust_decimal::Decimal;

use super::request::LineRequest;
use crate::error::{DomainError, Result};
use crate::inventory::Item;

/// A requested line with the price captured from the locked item row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedLine {
    pub item_id: ItemId,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

/// `unit_price × quantity`, exact.
pub fn line_subtotal(unit_price: Decimal, quantity: i32) -> Decimal {
    unit_price * Decimal::from(quantity)
}

/// Prices every line against the locked items and checks stock.
///
/// `items` must hold a row for every requested item. The first line short
/// on stock fails the whole order with [`DomainError::InsufficientStock`].
pub fn price_lines(lines: &[LineRequest], items: &[Item]) -> Result<(Vec<PricedLine>, Decimal)> {
    let mut priced = Vec::with_capacity(lines.len());
    let mut total = Decimal::ZERO;

    for line in lines {
        let item = items
            .iter()
            .find(|item| item.id == line.item_id)
            .ok_or(DomainError::ItemNotFound(line.item_id))?;

        item.ensure_available(line.quantity)?;

        let subtotal = line_subtotal(item.price, line.quantity);
        total += subtotal;
        priced.push(PricedLine {
            item_id: line.item_id,
            quantity: line.quantity,
            unit_price: item.price,
            subtotal,
        });
    }

    Ok((priced, total))
}
