/// Records shown per page when the config does not say otherwise
pub const DEFAULT_ROWS_PER_PAGE: usize = 10;

/// Pagination metadata calculated from total results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub page: usize,
    /// Total number of pages (0 when there is nothing to show)
    pub total_pages: usize,
    /// Index of the first row on the page
    pub offset: usize,
    pub rows_per_page: usize,
}

impl Pagination {
    /// Row range of the current page, clipped to `total`
    pub fn range(&self, total: usize) -> std::ops::Range<usize> {
        let start = self.offset.min(total);
        start..(start + self.rows_per_page).min(total)
    }
}

/// Calculate pagination metadata, clamping the page to [1, total_pages]
pub fn calculate_pagination(total: usize, requested_page: usize, rows_per_page: usize) -> Pagination {
    let rows_per_page = rows_per_page.max(1);
    let total_pages = total.div_ceil(rows_per_page);
    let page = requested_page.max(1).min(total_pages.max(1));

    Pagination {
        page,
        total_pages,
        offset: (page - 1) * rows_per_page,
        rows_per_page,
    }
}
