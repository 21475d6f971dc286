// @file: market_relay/src/core/paginator.rs
// @description: 1-based page slicing with totals computed over the full sequence.
// @author: LAS.

use crate::core::models::PageResult;


pub fn paginate<T>(items: Vec<T>, page: usize, page_size: usize) -> PageResult<T> {
    let total_items: usize = items.len();
    // page_size is validated upstream; guard anyway so the division below is safe
    let size: usize = page_size.max(1);
    let total_pages: usize = total_items.div_ceil(size);

    let start: usize = page.saturating_sub(1).saturating_mul(size);
    let data: Vec<T> = items.into_iter().skip(start).take(size).collect();

    PageResult {
        page,
        page_size,
        total_items,
        total_pages,
        data,
    }
}
