//! HTTP route handlers.

pub mod accounts;
pub mod health;
pub mod items;
pub mod metrics;
pub mod orders;

use serde::Deserialize;

/// Query parameters of numbered listings.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// Query parameters of keyset listings.
#[derive(Debug, Default, Deserialize)]
pub struct CursorParams {
    pub cursor: Option<String>,
    pub limit: Option<u32>,
}
