//! Pagination metadata and the uniform paginated result envelope.
//!
//! Every execution strategy funnels into [`paginate`] so callers always see
//! the same `{data, pagination}` shape regardless of how a table was served.

use serde::{Deserialize, Serialize};

/// Page metadata attached to every paginated result.
///
/// Pages are 1-indexed. An empty result set is reported as page 1 of 0
/// pages rather than an error.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PageMeta {
    /// The current page number, stable regardless of whether the caller's
    /// offset lands exactly on a page boundary.
    pub page: u64,
    /// Total matching rows across all pages.
    pub total_rows: u64,
    /// Total page count at the current limit.
    pub total_pages: u64,
}

/// The uniform paginated response envelope.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Paginated<T> {
    /// The rows of the requested page.
    pub data: Vec<T>,
    /// Metadata for navigating the full result set.
    pub pagination: PageMeta,
}

/// Computes page metadata from a total row count and the applied window.
///
/// A missing upstream count is treated as zero, never as an error.
/// `total_pages` is `ceil(total_rows / limit)` when both are positive,
/// otherwise 0; `page` is `offset / limit + 1` under the same condition,
/// otherwise 1.
pub fn paginate(total_rows: Option<u64>, limit: u64, offset: u64) -> PageMeta {
    let total_rows = total_rows.unwrap_or(0);

    let (page, total_pages) = if total_rows > 0 && limit > 0 {
        (offset / limit + 1, total_rows.div_ceil(limit))
    } else {
        (1, 0)
    };

    PageMeta {
        page,
        total_rows,
        total_pages,
    }
}
