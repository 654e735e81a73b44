use std::ops::Range;

use thiserror::Error;

/// Most page buttons shown at once in a pager.
pub const MAX_PAGE_BUTTONS: usize = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PageError {
    #[error("page size must be at least 1")]
    InvalidPageSize,

    #[error("page {page} is out of range (1-{total_pages})")]
    OutOfRange { page: usize, total_pages: usize },
}

pub fn total_pages(count: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    count.div_ceil(page_size)
}

/// Position of one page inside a filtered result. Derived, never stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageWindow {
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub range: Range<usize>,
}

impl PageWindow {
    /// Pages are 1-based. An empty result has zero pages but still accepts
    /// page 1, which yields an empty slice.
    pub fn compute(count: usize, page_size: usize, page: usize) -> Result<Self, PageError> {
        if page_size == 0 {
            return Err(PageError::InvalidPageSize);
        }
        let total = total_pages(count, page_size);
        let valid = if total == 0 {
            page == 1
        } else {
            (1..=total).contains(&page)
        };
        if !valid {
            return Err(PageError::OutOfRange {
                page,
                total_pages: total,
            });
        }
        let start = ((page - 1) * page_size).min(count);
        let end = (page * page_size).min(count);
        Ok(Self {
            page,
            page_size,
            total_pages: total,
            range: start..end,
        })
    }

    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

pub fn clamp_page(page: usize, total_pages: usize) -> usize {
    page.clamp(1, total_pages.max(1))
}

/// Consecutive page numbers for a pager, centred on `current` where possible.
pub fn page_buttons(current: usize, total_pages: usize) -> Vec<usize> {
    if total_pages <= 1 {
        return Vec::new();
    }
    let current = clamp_page(current, total_pages);
    let mut start = current.saturating_sub(2).max(1);
    let end = (start + MAX_PAGE_BUTTONS - 1).min(total_pages);
    if end - start < MAX_PAGE_BUTTONS - 1 {
        start = end.saturating_sub(MAX_PAGE_BUTTONS - 1).max(1);
    }
    (start..=end).collect()
}
