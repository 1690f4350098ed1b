use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;
pub const DEFAULT_SORT_BY: &str = "createdAt";
pub const DEFAULT_SORT_ORDER: &str = "desc";

/// Query-string keys consumed by the list endpoints themselves. Every other
/// key is forwarded as a filter.
pub const RESERVED_LIST_KEYS: [&str; 5] = ["search_term", "page", "limit", "sort_by", "sort_order"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
}

/// One window of a list endpoint's results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub meta: PageMeta,
    pub data: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(page: u64, limit: u64, total: u64, data: Vec<T>) -> Self {
        Self {
            meta: PageMeta { page, limit, total },
            data,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            meta: self.meta,
            data: self.data.into_iter().map(f).collect(),
        }
    }
}
