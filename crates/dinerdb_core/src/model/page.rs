//! Page window arithmetic for 1-indexed list endpoints.

use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;

/// SQL `LIMIT`/`OFFSET` pair for one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageWindow {
    pub limit: u32,
    pub offset: u64,
}

impl PageWindow {
    /// Row window `[(page - 1) * page_size, page * page_size)`.
    pub fn for_page(page: NonZeroU32, page_size: NonZeroU32) -> Self {
        let page_size = page_size.get();
        Self {
            limit: page_size,
            offset: u64::from(page.get() - 1) * u64::from(page_size),
        }
    }
}

/// Converts a caller page argument. Non-positive values yield `None`;
/// values past `u32::MAX` saturate, which only moves the window further
/// past the last row.
pub fn page_arg(value: i64) -> Option<NonZeroU32> {
    if value <= 0 {
        return None;
    }
    let clamped = u32::try_from(value).unwrap_or(u32::MAX);
    NonZeroU32::new(clamped)
}

/// Number of pages needed for `total` rows. Zero rows means zero pages.
pub fn page_count(total: u64, page_size: NonZeroU32) -> u64 {
    total.div_ceil(u64::from(page_size.get()))
}
