use serde::{Deserialize, Serialize};

/// Which page of results to return. Both fields are optional in the query
/// string; `page_num` is 1-based and pages hold at most 100 items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromForm, UriDisplayQuery)]
pub struct PaginationRequest {
    #[field(default = 1, validate = range(1..))]
    pub page_num: u32,
    #[field(default = 50, validate = range(1..=100))]
    pub page_size: u32,
}

impl PaginationRequest {
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// How many items precede this page.
    pub fn skip(&self) -> u64 {
        u64::from(self.page_num.saturating_sub(1)) * u64::from(self.page_size)
    }

    /// Wrap one page of items, given the total across all pages.
    pub fn to_paginated<T>(self, total: u64, items: Vec<T>) -> Paginated<T> {
        Paginated {
            pagination: PaginationResult {
                page_num: self.page_num,
                page_size: self.page_size,
                total,
            },
            items,
        }
    }
}

impl Default for PaginationRequest {
    fn default() -> Self {
        Self {
            page_num: 1,
            page_size: 50,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationResult {
    pub page_num: u32,
    pub page_size: u32,
    pub total: u64,
}

/// One page of items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    #[serde(flatten)]
    pub pagination: PaginationResult,
    pub items: Vec<T>,
}
