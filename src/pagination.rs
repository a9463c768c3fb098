use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::vehicles::Vehicle;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// `?page=&page_size=` query parameters, 1-based
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
pub struct PageRequest {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: Some(page),
            page_size: Some(page_size),
        }
    }

    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size())
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page() - 1) * self.limit()
    }
}

/// One page of results plus the totals needed to render a pager
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[aliases(VehiclePage = PagedResult<Vehicle>)]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub current_page: u32,
    pub page_size: u32,
    pub total_count: i64,
    pub total_pages: u32,
}

impl<T> PagedResult<T> {
    pub fn new(items: Vec<T>, total_count: i64, request: &PageRequest) -> Self {
        let page_size = request.page_size();
        Self {
            items,
            current_page: request.page(),
            page_size,
            total_count,
            total_pages: total_pages(total_count, page_size),
        }
    }

    /// Convert the items, keeping the paging totals
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PagedResult<U> {
        PagedResult {
            items: self.items.into_iter().map(f).collect(),
            current_page: self.current_page,
            page_size: self.page_size,
            total_count: self.total_count,
            total_pages: self.total_pages,
        }
    }
}

/// `ceil(total / page_size)`
pub fn total_pages(total_count: i64, page_size: u32) -> u32 {
    if total_count <= 0 || page_size == 0 {
        return 0;
    }
    let size = i64::from(page_size);
    ((total_count + size - 1) / size) as u32
}
