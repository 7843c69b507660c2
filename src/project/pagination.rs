use std::ops::Range;

use serde::Serialize;

use crate::config::{DEFAULT_PAGE_SIZE, DEFAULT_PAGE_SIZES, PaginationConfig};

/// Page selection over projected rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page_size: usize,
    /// 1-based.
    pub page_number: usize,
    /// Sizes offered to the user, ascending, always containing `page_size`.
    pub page_sizes: Vec<usize>,
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE, DEFAULT_PAGE_SIZES.to_vec())
    }
}

impl Pagination {
    /// First page. A zero page size counts as one row per page.
    pub fn new(page_size: usize, mut page_sizes: Vec<usize>) -> Self {
        let page_size = page_size.max(1);
        if !page_sizes.contains(&page_size) {
            page_sizes.push(page_size);
        }
        page_sizes.sort_unstable();
        page_sizes.dedup();
        Self {
            page_size,
            page_number: 1,
            page_sizes,
        }
    }

    /// `None` when the table is not paginated.
    pub fn from_config(config: Option<&PaginationConfig>) -> Option<Self> {
        let config = config?;
        Some(Self::new(
            config.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            config
                .page_sizes
                .clone()
                .unwrap_or_else(|| DEFAULT_PAGE_SIZES.to_vec()),
        ))
    }

    pub fn with_page(self, page_number: usize) -> Self {
        Self {
            page_number,
            ..self
        }
    }

    /// Change the page size and go back to the first page.
    pub fn with_page_size(self, page_size: usize) -> Self {
        Self::new(page_size, self.page_sizes)
    }

    /// Rows of the current page among `total` rows. Page 0 is page 1.
    pub fn range(&self, total: usize) -> Range<usize> {
        let page = self.page_number.max(1) - 1;
        let start = self.page_size.saturating_mul(page).min(total);
        let end = start.saturating_add(self.page_size).min(total);
        start..end
    }

    /// Number of pages for `total` rows; an empty table still has one page.
    pub fn page_count(&self, total: usize) -> usize {
        total.div_ceil(self.page_size).max(1)
    }
}
