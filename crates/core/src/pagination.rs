//! Page/limit handling shared by every listing operation.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

/// A validated page request: `page >= 1`, `1 <= limit <= 100`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    /// Validate raw query values. Absent values take the defaults; present but
    /// out-of-range values are rejected rather than clamped.
    pub fn new(page: Option<i64>, limit: Option<i64>) -> DomainResult<Self> {
        let page = match page {
            None => DEFAULT_PAGE,
            Some(p) if p >= 1 && p <= u32::MAX as i64 => p as u32,
            Some(p) => return Err(DomainError::invalid(format!("page must be >= 1, got {p}"))),
        };

        let limit = match limit {
            None => DEFAULT_LIMIT,
            Some(l) if (1..=MAX_LIMIT as i64).contains(&l) => l as u32,
            Some(l) => {
                return Err(DomainError::invalid(format!(
                    "limit must be between 1 and {MAX_LIMIT}, got {l}"
                )));
            }
        };

        Ok(Self { page, limit })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of rows to skip.
    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.limit as u64
    }

    pub fn page_info(&self, total: u64) -> PageInfo {
        let limit = self.limit as u64;
        PageInfo {
            page: self.page,
            limit: self.limit,
            total,
            total_pages: total.div_ceil(limit),
        }
    }

    /// Slice an already ordered in-memory collection.
    pub fn slice<T: Clone>(&self, items: &[T]) -> Vec<T> {
        let start = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        items
            .iter()
            .skip(start)
            .take(self.limit as usize)
            .cloned()
            .collect()
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}

/// One page of results plus its metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub meta: PageInfo,
}

impl<T> Paged<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        Self {
            items,
            meta: request.page_info(total),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paged<U> {
        Paged {
            items: self.items.into_iter().map(f).collect(),
            meta: self.meta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use proptest::prelude::*;

    #[test]
    fn defaults_apply_when_absent() {
        let p = PageRequest::new(None, None).unwrap();
        assert_eq!((p.page(), p.limit()), (1, 10));
    }

    #[test]
    fn limit_boundary() {
        assert!(PageRequest::new(Some(1), Some(100)).is_ok());
        assert_matches!(
            PageRequest::new(Some(1), Some(101)),
            Err(DomainError::InvalidRequest(_))
        );
        assert_matches!(
            PageRequest::new(Some(1), Some(0)),
            Err(DomainError::InvalidRequest(_))
        );
    }

    #[test]
    fn page_zero_is_rejected() {
        assert_matches!(
            PageRequest::new(Some(0), None),
            Err(DomainError::InvalidRequest(_))
        );
    }

    #[test]
    fn total_pages_rounds_up() {
        let p = PageRequest::new(Some(2), Some(10)).unwrap();
        let info = p.page_info(21);
        assert_eq!(info.total_pages, 3);
        assert_eq!(p.offset(), 10);
        assert_eq!(PageRequest::default().page_info(0).total_pages, 0);
    }

    #[test]
    fn slice_takes_the_requested_window() {
        let items: Vec<u32> = (0..25).collect();
        let p = PageRequest::new(Some(3), Some(10)).unwrap();
        assert_eq!(p.slice(&items), vec![20, 21, 22, 23, 24]);
    }

    proptest! {
        #[test]
        fn accepted_limits_are_exactly_one_to_hundred(limit in -50i64..200) {
            let accepted = PageRequest::new(None, Some(limit)).is_ok();
            prop_assert_eq!(accepted, (1..=100).contains(&limit));
        }

        #[test]
        fn pages_cover_every_row(total in 0u64..10_000, limit in 1i64..=100) {
            let p = PageRequest::new(None, Some(limit)).unwrap();
            let info = p.page_info(total);
            prop_assert!(info.total_pages * limit as u64 >= total);
            prop_assert!(info.total_pages == 0 || (info.total_pages - 1) * (limit as u64) < total);
        }
    }
}
