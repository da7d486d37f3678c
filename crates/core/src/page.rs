//! Pagination primitives shared by list queries and API responses.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Default page number when the caller omits one (1-based).
pub const DEFAULT_PAGE: u32 = 1;
/// Default page size when the caller omits one.
pub const DEFAULT_LIMIT: u32 = 10;
/// Hard cap on page size.
pub const MAX_LIMIT: u32 = 100;

/// Sort direction for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl FromStr for SortDirection {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(DomainError::validation(format!(
                "unknown sort direction: {other}"
            ))),
        }
    }
}

impl core::fmt::Display for SortDirection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Asc => f.write_str("asc"),
            Self::Desc => f.write_str("desc"),
        }
    }
}

/// Validated page/limit pair for list queries.
///
/// Invalid values are rejected rather than clamped, so a caller asking for
/// `page=0` or `limit=5000` hears about it instead of silently getting
/// something else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    pub fn new(page: u32, limit: u32) -> DomainResult<Self> {
        if page < 1 {
            return Err(DomainError::validation("page must be at least 1"));
        }
        if limit < 1 || limit > MAX_LIMIT {
            return Err(DomainError::validation(format!(
                "limit must be between 1 and {MAX_LIMIT}"
            )));
        }
        Ok(Self { page, limit })
    }

    /// Build from optional query parameters, falling back to the defaults.
    pub fn from_params(page: Option<u32>, limit: Option<u32>) -> DomainResult<Self> {
        Self::new(page.unwrap_or(DEFAULT_PAGE), limit.unwrap_or(DEFAULT_LIMIT))
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of records to skip (0-based offset into the result set).
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

/// One page of results plus the totals callers need for paging.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub results: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u64,
    pub total_results: u64,
}

impl<T> Page<T> {
    pub fn new(results: Vec<T>, request: PageRequest, total_results: u64) -> Self {
        Self {
            results,
            page: request.page(),
            limit: request.limit(),
            total_pages: total_results.div_ceil(u64::from(request.limit())),
            total_results,
        }
    }

    /// Map the results while keeping the paging envelope intact.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            results: self.results.into_iter().map(f).collect(),
            page: self.page,
            limit: self.limit,
            total_pages: self.total_pages,
            total_results: self.total_results,
        }
    }
}
