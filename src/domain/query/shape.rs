//! Result shapes, ordering, pagination and loader hints

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Ordering applied to materialized listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub column: String,
    #[serde(default)]
    pub direction: Direction,
}

impl OrderBy {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: Direction::Desc,
        }
    }
}

/// Pagination parameters, 1-based page number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageParams {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_size")]
    pub size: u32,
}

fn default_page() -> u32 {
    1
}

fn default_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            size: default_size(),
        }
    }
}

impl PageParams {
    pub fn new(page: u32, size: u32) -> Self {
        Self { page, size }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.page < 1 {
            return Err(DomainError::invalid_query("page must be at least 1"));
        }

        if self.size < 1 || self.size > MAX_PAGE_SIZE {
            return Err(DomainError::invalid_query(format!(
                "size must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }

        Ok(())
    }

    pub fn limit(&self) -> i64 {
        self.size as i64
    }

    pub fn offset(&self) -> i64 {
        (self.page.saturating_sub(1) as i64) * self.size as i64
    }
}

/// A bounded page of results plus pagination metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<E> {
    pub items: Vec<E>,
    pub total: u64,
    pub page: u32,
    pub size: u32,
    pub pages: u32,
}

impl<E> Page<E> {
    pub fn new(items: Vec<E>, total: u64, params: PageParams) -> Self {
        let pages = if params.size == 0 {
            0
        } else {
            total.div_ceil(params.size as u64) as u32
        };

        Self {
            items,
            total,
            page: params.page,
            size: params.size,
            pages,
        }
    }
}

/// Shape of a read's result
#[derive(Debug, Clone, PartialEq)]
pub enum ResultShape {
    /// At most one row
    First,
    /// Every match, materialized
    All { order_by: Option<OrderBy> },
    /// One page of matches
    Paged(PageParams),
    /// Lazily consumed cursor over every match
    Streamed,
}

/// Row-locking hints appended to a SELECT
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadHint {
    ForUpdate,
    ForShare,
    SkipLocked,
    NoWait,
}

impl LoadHint {
    pub fn sql(&self) -> &'static str {
        match self {
            Self::ForUpdate => "FOR UPDATE",
            Self::ForShare => "FOR SHARE",
            Self::SkipLocked => "SKIP LOCKED",
            Self::NoWait => "NOWAIT",
        }
    }

    fn is_lock_mode(&self) -> bool {
        matches!(self, Self::ForUpdate | Self::ForShare)
    }
}

/// Render hints in SQL order: lock mode first, then wait policy
///
/// A wait policy without a lock mode is dropped, Postgres rejects it.
pub fn hints_sql(hints: &[LoadHint]) -> Option<String> {
    let mode = hints.iter().find(|h| h.is_lock_mode())?;
    let mut sql = mode.sql().to_string();

    if let Some(policy) = hints.iter().find(|h| !h.is_lock_mode()) {
        sql.push(' ');
        sql.push_str(policy.sql());
    }

    Some(sql)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_params_defaults() {
        let params = PageParams::default();
        assert_eq!(params.page, 1);
        assert_eq!(params.size, DEFAULT_PAGE_SIZE);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_page_params_validation() {
        assert!(PageParams::new(0, 10).validate().is_err());
        assert!(PageParams::new(1, 0).validate().is_err());
        assert!(PageParams::new(1, MAX_PAGE_SIZE + 1).validate().is_err());
        assert!(PageParams::new(3, MAX_PAGE_SIZE).validate().is_ok());
    }

    #[test]
    fn test_page_offset() {
        assert_eq!(PageParams::new(1, 20).offset(), 0);
        assert_eq!(PageParams::new(3, 20).offset(), 40);
        assert_eq!(PageParams::new(3, 20).limit(), 20);
    }

    #[test]
    fn test_page_count() {
        let page: Page<u8> = Page::new(vec![1, 2], 12, PageParams::new(2, 5));
        assert_eq!(page.pages, 3);
        assert_eq!(page.total, 12);

        let empty: Page<u8> = Page::new(vec![], 0, PageParams::default());
        assert_eq!(empty.pages, 0);
    }

    #[test]
    fn test_hints_sql() {
        assert_eq!(hints_sql(&[]), None);
        assert_eq!(hints_sql(&[LoadHint::SkipLocked]), None);
        assert_eq!(
            hints_sql(&[LoadHint::SkipLocked, LoadHint::ForUpdate]).as_deref(),
            Some("FOR UPDATE SKIP LOCKED")
        );
        assert_eq!(hints_sql(&[LoadHint::ForShare]).as_deref(), Some("FOR SHARE"));
    }
}
