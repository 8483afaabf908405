use chrono::{DateTime, Utc};
use common::ItemId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, Row};
use store::sqlstate;

use crate::error::{DomainError, Result};

/// Revision counter of an item row.
///
/// Starts at 1 and increases by one on every successful stock mutation, so a
/// reader can detect that the row changed since it was read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Revision(i64);

impl Revision {
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// The revision of a freshly inserted item.
    pub const fn initial() -> Self {
        Self(1)
    }

    pub const fn as_i64(&self) -> i64 {
        self.0
    }

    /// The revision after one more mutation.
    pub const fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A catalog item with its on-hand stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub quantity: i32,
    pub revision: Revision,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Fails with [`DomainError::InsufficientStock`] unless at least
    /// `requested` units are on hand.
    pub fn ensure_available(&self, requested: i32) -> Result<()> {
        if self.quantity < requested {
            return Err(DomainError::InsufficientStock {
                item_id: self.id,
                requested,
                available: self.quantity,
            });
        }
        Ok(())
    }
}

/// Fields for a new item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub quantity: i32,
}

impl NewItem {
    pub fn validate(&self) -> Result<()> {
        if self.sku.trim().is_empty() {
            return Err(DomainError::InvalidRequest("sku must not be empty".into()));
        }
        if self.name.trim().is_empty() {
            return Err(DomainError::InvalidRequest("name must not be empty".into()));
        }
        if self.price.is_sign_negative() {
            return Err(DomainError::InvalidRequest(format!(
                "price must not be negative: {}",
                self.price
            )));
        }
        if self.quantity < 0 {
            return Err(DomainError::InvalidRequest(format!(
                "quantity must not be negative: {}",
                self.quantity
            )));
        }
        Ok(())
    }
}

/// Column list matching [`row_to_item`].
pub const ITEM_COLUMNS: &str =
    "id, sku, name, description, price, quantity, revision, created_at, updated_at";

/// Maps an `items` row selected with [`ITEM_COLUMNS`].
pub fn row_to_item(row: &PgRow) -> std::result::Result<Item, sqlx::Error> {
    Ok(Item {
        id: ItemId::new(row.try_get("id")?),
        sku: row.try_get("sku")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        price: row.try_get("price")?,
        quantity: row.try_get("quantity")?,
        revision: Revision::new(row.try_get("revision")?),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Inserts an item at revision 1. A taken SKU is
/// [`DomainError::AlreadyExists`].
pub async fn insert_item(conn: &mut PgConnection, item: &NewItem) -> Result<Item> {
    let sql = format!(
        r#"
        INSERT INTO items (sku, name, description, price, quantity)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {ITEM_COLUMNS}
        "#
    );

    let row = sqlx::query(&sql)
        .bind(item.sku.trim())
        .bind(item.name.trim())
        .bind(item.description.as_deref())
        .bind(item.price)
        .bind(item.quantity)
        .fetch_one(conn)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.code().as_deref() == Some(sqlstate::UNIQUE_VIOLATION)
            {
                return DomainError::AlreadyExists(format!("item with sku {}", item.sku));
            }
            DomainError::Store(e)
        })?;

    Ok(row_to_item(&row)?)
}

/// Reads an item without locking it.
pub async fn fetch_item(conn: &mut PgConnection, id: ItemId) -> Result<Item> {
    let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = $1");
    let row = sqlx::query(&sql)
        .bind(id.as_i64())
        .fetch_optional(conn)
        .await?
        .ok_or(DomainError::ItemNotFound(id))?;

    Ok(row_to_item(&row)?)
}

/// Existence probe used to tell a missing row from a lost race.
pub(crate) async fn item_exists(conn: &mut PgConnection, id: ItemId) -> Result<bool> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM items WHERE id = $1)")
        .bind(id.as_i64())
        .fetch_one(conn)
        .await?;
    Ok(exists)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn new_item() -> NewItem {
        NewItem {
            sku: "SKU-001".into(),
            name: "Widget".into(),
            description: None,
            price: Decimal::from_str("19.99").unwrap(),
            quantity: 10,
        }
    }

    #[test]
    fn test_revision_starts_at_one_and_increments() {
        assert_eq!(Revision::initial().as_i64(), 1);
        assert_eq!(Revision::initial().next(), Revision::new(2));
    }

    #[test]
    fn test_new_item_validation() {
        assert!(new_item().validate().is_ok());

        let free = NewItem {
            price: Decimal::ZERO,
            quantity: 0,
            ..new_item()
        };
        assert!(free.validate().is_ok());

        let negative_price = NewItem {
            price: Decimal::from_str("-1.00").unwrap(),
            ..new_item()
        };
        assert!(matches!(
            negative_price.validate(),
            Err(DomainError::InvalidRequest(_))
        ));

        let negative_quantity = NewItem {
            quantity: -1,
            ..new_item()
        };
        assert!(negative_quantity.validate().is_err());

        let blank_sku = NewItem {
            sku: " ".into(),
            ..new_item()
        };
        assert!(blank_sku.validate().is_err());
    }

    #[test]
    fn test_ensure_available_reports_shortfall() {
        let item = Item {
            id: ItemId::new(3),
            sku: "SKU-003".into(),
            name: "Gadget".into(),
            description: Some("A gadget".into()),
            price: Decimal::new(500, 2),
            quantity: 2,
            revision: Revision::initial(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert!(item.ensure_available(2).is_ok());
        match item.ensure_available(3) {
            Err(DomainError::InsufficientStock {
                item_id,
                requested,
                available,
            }) => {
                assert_eq!(item_id, ItemId::new(3));
                assert_eq!(requested, 3);
                assert_eq!(available, 2);
            }
            other => panic!("expected insufficient stock, got {other:?}"),
        }
    }
}
