//! Pagination of service listings.

use serde::{Deserialize, Serialize};

use super::ServiceRecord;
use crate::error::{Error, Result};

/// Default number of rows per page.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Page sizes offered to users.
pub const PAGE_SIZE_CHOICES: [usize; 4] = [10, 20, 50, 100];

/// Number of pages needed for `total` items; zero when there are no items.
pub fn page_count(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size)
}

/// A requested page. `page` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: usize,
    pub page_size: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Create a request, lifting `page` and `page_size` to at least 1.
    pub fn new(page: usize, page_size: usize) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
        }
    }

    /// Zero-based index of the first item on this page.
    pub fn offset(&self) -> usize {
        self.page.saturating_sub(1).saturating_mul(self.page_size)
    }

    /// Clamp `page` into `[1, page_count(total)]` (or to 1 when `total` is 0).
    ///
    /// # Examples
    /// ```
    /// use servicedash_core::PageRequest;
    ///
    /// assert_eq!(PageRequest::new(4, 20).clamp(45), PageRequest::new(3, 20));
    /// assert_eq!(PageRequest::new(7, 20).clamp(0), PageRequest::new(1, 20));
    /// ```
    pub fn clamp(&self, total: usize) -> Self {
        let last = page_count(total, self.page_size).max(1);
        Self {
            page: self.page.clamp(1, last),
            page_size: self.page_size,
        }
    }
}

/// Metadata describing one page of a larger result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageMeta {
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
}

impl PageMeta {
    pub fn page_count(&self) -> usize {
        page_count(self.total, self.page_size)
    }

    /// Whether `page` lies past the last page. An empty result has one
    /// (empty) page, so only page 1 is in range.
    pub fn is_out_of_range(&self) -> bool {
        self.page > self.page_count().max(1)
    }

    /// Check server-supplied metadata against the number of items delivered.
    pub fn check(&self, item_count: usize) -> Result<()> {
        if self.page == 0 {
            return Err(Error::PaginationInconsistency(
                "page index must be at least 1".to_string(),
            ));
        }
        if self.page_size == 0 {
            return Err(Error::PaginationInconsistency(
                "page size must be positive".to_string(),
            ));
        }
        if item_count > self.page_size {
            return Err(Error::PaginationInconsistency(format!(
                "{} items exceed page size {}",
                item_count, self.page_size
            )));
        }
        if item_count > self.total {
            return Err(Error::PaginationInconsistency(format!(
                "{} items exceed total {}",
                item_count, self.total
            )));
        }
        Ok(())
    }
}

/// One page of records together with its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageResult {
    pub items: Vec<ServiceRecord>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
}

impl PageResult {
    pub fn page_count(&self) -> usize {
        page_count(self.total, self.page_size)
    }

    pub fn meta(&self) -> PageMeta {
        PageMeta {
            total: self.total,
            page: self.page,
            page_size: self.page_size,
        }
    }
}

/// Slice an already-ordered sequence into the requested page.
///
/// The slice is clamped to the sequence bounds; a page past the end yields no
/// items. `page` is reported as requested, see [`PageRequest::clamp`] to pull
/// it back into range first.
pub fn paginate(records: &[ServiceRecord], request: PageRequest) -> PageResult {
    let total = records.len();
    let start = request.offset().min(total);
    let end = start.saturating_add(request.page_size).min(total);
    PageResult {
        items: records[start..end].to_vec(),
        total,
        page: request.page,
        page_size: request.page_size,
    }
}
