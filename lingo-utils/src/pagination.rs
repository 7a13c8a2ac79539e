/// Default page size for admin listings.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Number of pages needed for `total_items`; always at least one.
pub fn total_pages(total_items: usize, per_page: usize) -> usize {
    let per_page = per_page.max(1);
    let pages = total_items.div_ceil(per_page);
    pages.max(1)
}

/// SQL `LIMIT`/`OFFSET` pair for a 1-based page.
pub fn limit_offset(per_page: usize, page: usize) -> (i64, i64) {
    let per_page = per_page.max(1);
    let offset = page.max(1).saturating_sub(1).saturating_mul(per_page);
    (
        i64::try_from(per_page).unwrap_or(i64::MAX),
        i64::try_from(offset).unwrap_or(i64::MAX),
    )
}
