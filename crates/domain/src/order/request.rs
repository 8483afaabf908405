use std::collections::HashSet;

use common::{AccountId, ItemId};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, Result};

/// One requested line: an item and how many units of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRequest {
    pub item_id: ItemId,
    pub quantity: i32,
}

impl LineRequest {
    pub fn new(item_id: ItemId, quantity: i32) -> Self {
        Self { item_id, quantity }
    }
}

/// Request to place an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrder {
    pub account_id: AccountId,
    pub lines: Vec<LineRequest>,
}

impl CreateOrder {
    pub fn new(account_id: AccountId, lines: Vec<LineRequest>) -> Self {
        Self { account_id, lines }
    }

    /// Adds a line.
    pub fn with_line(mut self, item_id: ItemId, quantity: i32) -> Self {
        self.lines.push(LineRequest::new(item_id, quantity));
        self
    }

    /// Checks that there is at least one line, every quantity is positive
    /// and no item appears twice.
    pub fn validate(&self) -> Result<()> {
        if self.lines.is_empty() {
            return Err(DomainError::InvalidRequest(
                "order must contain at least one line".into(),
            ));
        }

        let mut seen = HashSet::with_capacity(self.lines.len());
        for line in &self.lines {
            if line.quantity <= 0 {
                return Err(DomainError::InvalidRequest(format!(
                    "quantity for item {} must be positive, got {}",
                    line.item_id, line.quantity
                )));
            }
            if !seen.insert(line.item_id) {
                return Err(DomainError::InvalidRequest(format!(
                    "item {} appears more than once",
                    line.item_id
                )));
            }
        }
        Ok(())
    }

    /// Returns the lines sorted by ascending item id, the order in which
    /// their rows are locked.
    pub fn sorted_lines(&self) -> Vec<LineRequest> {
        let mut lines = self.lines.clone();
        lines.sort_unstable_by_key(|l| l.item_id);
        lines
    }
}
