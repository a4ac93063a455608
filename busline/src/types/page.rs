//! Pagination

use serde::{Deserialize, Serialize};

/// Pagination metadata returned with every list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// One-based page number
    pub current_page: u32,
    /// Page size used by the backend
    pub item_page_size: u32,
    /// Records across all pages
    pub total_records: u64,
    /// Number of pages
    pub total_pages: u32,
}

/// One page of a list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items on this page
    pub items: Vec<T>,
    /// `None` when the backend answered without pagination (e.g. an empty search)
    pub pagination: Option<Pagination>,
}

impl<T> Page<T> {
    /// A page with no items and no pagination
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            items: Vec::new(),
            pagination: None,
        }
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self::empty()
    }
}

/// `PageNumber` / `PageSize` query parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// One-based page number
    pub page: u32,
    /// Items per page
    pub page_size: u32,
}

impl PageRequest {
    /// Create a page request; page numbers below 1 are clamped to 1
    #[must_use]
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
        }
    }

    /// The first page with the given size
    #[must_use]
    pub fn first(page_size: u32) -> Self {
        Self::new(1, page_size)
    }

    pub(crate) fn query(self) -> [(&'static str, String); 2] {
        [
            ("PageNumber", self.page.to_string()),
            ("PageSize", self.page_size.to_string()),
        ]
    }
}
