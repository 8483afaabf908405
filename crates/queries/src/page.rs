use serde::Serialize;

use crate::cursor::{self, Position};

/// Default and maximum page sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default: u32,
    pub max: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default: 20,
            max: 100,
        }
    }
}

impl PageLimits {
    pub fn new(default: u32, max: u32) -> Self {
        let max = max.max(1);
        Self {
            default: default.clamp(1, max),
            max,
        }
    }

    /// Resolves a requested page size: absent or zero takes the default,
    /// anything above the maximum is clamped to it.
    pub fn resolve(&self, requested: Option<u32>) -> u32 {
        match requested {
            None | Some(0) => self.default,
            Some(n) => n.min(self.max),
        }
    }
}

/// One page of a keyset scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CursorPage<T> {
    pub items: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

impl<T> CursorPage<T> {
    /// Builds a page from a query that fetched `limit + 1` rows.
    ///
    /// The extra row only signals that more remain; it is dropped, and the
    /// next token points at the last row kept. A zero limit is read as 1 so
    /// a page that reports more rows always carries a token.
    pub fn from_overfetch(
        mut rows: Vec<T>,
        limit: u32,
        position_of: impl Fn(&T) -> Position,
    ) -> Self {
        let limit = usize::try_from(limit.max(1)).unwrap_or(usize::MAX);
        let has_more = rows.len() > limit;
        rows.truncate(limit);

        let next_cursor = if has_more {
            rows.last().map(|row| cursor::encode(&position_of(row)))
        } else {
            None
        };

        Self {
            items: rows,
            next_cursor,
            has_more,
        }
    }
}

/// One page of an offset scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OffsetPage<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

impl<T> OffsetPage<T> {
    pub fn new(items: Vec<T>, total: i64, page: u32, page_size: u32) -> Self {
        let total_pages = if page_size == 0 || total <= 0 {
            0
        } else {
            u32::try_from((total + i64::from(page_size) - 1) / i64::from(page_size))
                .unwrap_or(u32::MAX)
        };

        Self {
            items,
            total,
            page,
            page_size,
            total_pages,
        }
    }
}

/// Row offset of a 1-based page. Page 0 is treated as page 1.
pub fn offset_of(page: u32, page_size: u32) -> i64 {
    i64::from(page.max(1) - 1) * i64::from(page_size)
}
