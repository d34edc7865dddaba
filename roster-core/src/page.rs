//! Pagination parameters for list queries.

use serde::{Deserialize, Serialize};

/// Largest page size a caller may request.
pub const MAX_PAGE_SIZE: usize = 100;

/// A 1-based page request.
///
/// List operations return bare records for the requested page; the total is
/// a separate count operation, so callers compute total pages themselves.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// The page number (1-indexed).
    pub page: usize,
    /// Number of records per page.
    pub size: usize,
}

impl PageRequest {
    /// Creates new pagination parameters.
    pub fn new(page: usize, size: usize) -> Self {
        Self { page, size }
    }

    /// Number of records to skip before this page starts.
    pub fn offset(&self) -> usize {
        self.page.saturating_sub(1) * self.size
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 1, size: 10 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_is_zero_based() {
        assert_eq!(PageRequest::new(1, 10).offset(), 0);
        assert_eq!(PageRequest::new(2, 10).offset(), 10);
        assert_eq!(PageRequest::new(3, 25).offset(), 50);
    }

    #[test]
    fn offset_does_not_underflow_on_page_zero() {
        assert_eq!(PageRequest::new(0, 10).offset(), 0);
    }

    #[test]
    fn default_is_first_page_of_ten() {
        assert_eq!(PageRequest::default(), PageRequest::new(1, 10));
    }
}
