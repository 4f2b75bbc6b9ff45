//! Paginated result shape exposed to presentation layers.

use serde::Serialize;

/// One page of a fully sorted, fully scored result set.
#[derive(Debug, Clone, Serialize)]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    /// 1-based page number as requested.
    pub page: usize,
    pub page_size: usize,
    pub total_count: usize,
    pub total_pages: usize,
    /// Whether the underlying result set was served from a cache entry.
    pub from_cache: bool,
}

/// Slice a fully sorted list into one page.
///
/// Pages are 1-based; a page beyond the end yields an empty item list
/// with the counts intact. `page_size` is clamped to at least 1.
pub fn paginate<T: Clone>(
    items: &[T],
    page: usize,
    page_size: usize,
    from_cache: bool,
) -> PagedResult<T> {
    let page = page.max(1);
    let page_size = page_size.max(1);
    let total_count = items.len();
    let total_pages = total_count.div_ceil(page_size);

    let start = (page - 1).saturating_mul(page_size);
    let slice = if start >= total_count {
        &[]
    } else {
        &items[start..(start + page_size).min(total_count)]
    };

    PagedResult {
        items: slice.to_vec(),
        page,
        page_size,
        total_count,
        total_pages,
        from_cache,
    }
}
