//! Pagination metadata for listing responses.

use serde::{Deserialize, Serialize};

/// Pagination envelope attached to every listing response.
///
/// `total_records` always reflects the true master count, even when
/// individual records were dropped from the page during aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub page: u32,
    pub page_size: u32,
    pub total_records: i64,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_previous: bool,
}

impl PaginationMeta {
    /// Build pagination metadata from the request window and the total count.
    ///
    /// `total_pages` is `ceil(total_records / page_size)`, or `0` when
    /// `page_size` is `0` (the service validates page_size >= 1, so the
    /// zero branch is belt-and-braces for direct callers).
    pub fn build(page: u32, page_size: u32, total_records: i64) -> Self {
        let total = total_records.max(0) as u64;
        let total_pages = if page_size == 0 {
            0
        } else {
            total.div_ceil(page_size as u64) as u32
        };

        Self {
            page,
            page_size,
            total_records,
            total_pages,
            has_next: page < total_pages,
            has_previous: page > 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages_is_ceiling() {
        assert_eq!(PaginationMeta::build(1, 2, 5).total_pages, 3);
        assert_eq!(PaginationMeta::build(1, 2, 4).total_pages, 2);
        assert_eq!(PaginationMeta::build(1, 20, 0).total_pages, 0);
        assert_eq!(PaginationMeta::build(1, 20, 1).total_pages, 1);
    }

    #[test]
    fn test_has_next_and_previous() {
        let first = PaginationMeta::build(1, 2, 5);
        assert!(first.has_next);
        assert!(!first.has_previous);

        let middle = PaginationMeta::build(2, 2, 5);
        assert!(middle.has_next);
        assert!(middle.has_previous);

        let last = PaginationMeta::build(3, 2, 5);
        assert!(!last.has_next);
        assert!(last.has_previous);
    }

    #[test]
    fn test_page_beyond_total_has_no_next() {
        let meta = PaginationMeta::build(9, 2, 5);
        assert_eq!(meta.total_pages, 3);
        assert!(!meta.has_next);
        assert!(meta.has_previous);
    }

    #[test]
    fn test_zero_page_size_yields_zero_pages() {
        let meta = PaginationMeta::build(1, 0, 100);
        assert_eq!(meta.total_pages, 0);
        assert!(!meta.has_next);
    }
}
