//! Offset pagination and sorting for list reads.

use serde::Serialize;

use crate::error::AppError;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

/// A validated page request: `page >= 1`, `1 <= limit <= MAX_LIMIT`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    /// Build from optional query values.
    ///
    /// Missing values fall back to defaults, zero is rejected,
    /// oversized limits are clamped.
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Result<Self, AppError> {
        let page = page.unwrap_or(DEFAULT_PAGE);
        let limit = limit.unwrap_or(DEFAULT_LIMIT);

        if page == 0 {
            return Err(AppError::bad_request("page must be at least 1"));
        }
        if limit == 0 {
            return Err(AppError::bad_request("limit must be at least 1"));
        }

        Ok(Self {
            page,
            limit: limit.min(MAX_LIMIT),
        })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Rows to skip before this page
    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.limit as i64
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

/// One page of a list read
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_items: i64,
    pub per_page: u32,
    pub current_page: u32,
    pub total_pages: i64,
    pub has_prev_page: bool,
    pub has_next_page: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total_items: i64, request: PageRequest) -> Self {
        let per_page = request.limit();
        let total_pages = if total_items <= 0 {
            0
        } else {
            (total_items + per_page as i64 - 1) / per_page as i64
        };
        let current_page = request.page();

        Self {
            items,
            total_items,
            per_page,
            current_page,
            total_pages,
            has_prev_page: current_page > 1,
            has_next_page: (current_page as i64) < total_pages,
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    /// Accepts `asc`/`desc` as well as `1`/`-1`.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "asc" | "1" => Ok(Self::Asc),
            "desc" | "-1" => Ok(Self::Desc),
            other => Err(AppError::bad_request(format!(
                "Invalid sortType '{other}'. Must be one of: asc, desc, 1, -1"
            ))),
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Sortable video columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoSortField {
    #[default]
    CreatedAt,
    Views,
    Duration,
    Title,
}

impl VideoSortField {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        match raw.trim() {
            "createdAt" | "created_at" => Ok(Self::CreatedAt),
            "views" => Ok(Self::Views),
            "duration" => Ok(Self::Duration),
            "title" => Ok(Self::Title),
            other => Err(AppError::bad_request(format!(
                "Invalid sortBy '{other}'. Must be one of: createdAt, views, duration, title"
            ))),
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            Self::CreatedAt => "v.created_at",
            Self::Views => "v.views",
            Self::Duration => "v.duration",
            Self::Title => "v.title",
        }
    }
}

/// Video list filter and order
#[derive(Debug, Clone, Default)]
pub struct VideoQuery {
    /// Only videos owned by this user
    pub owner_id: Option<String>,
    pub sort_by: VideoSortField,
    pub sort_direction: SortDirection,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_request_defaults_and_clamps() {
        let request = PageRequest::new(None, None).unwrap();
        assert_eq!(request.page(), 1);
        assert_eq!(request.limit(), 10);
        assert_eq!(request.offset(), 0);

        let request = PageRequest::new(Some(3), Some(500)).unwrap();
        assert_eq!(request.limit(), MAX_LIMIT);
        assert_eq!(request.offset(), 200);
    }

    #[test]
    fn page_request_rejects_zero() {
        assert!(matches!(
            PageRequest::new(Some(0), None),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            PageRequest::new(None, Some(0)),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn page_counts_total_pages() {
        let request = PageRequest::new(Some(2), Some(10)).unwrap();
        let page = Page::new(vec![1, 2, 3], 23, request);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_prev_page);
        assert!(page.has_next_page);

        let empty: Page<i32> = Page::new(vec![], 0, PageRequest::default());
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next_page);
        assert!(!empty.has_prev_page);
    }

    #[test]
    fn sort_parsing() {
        assert_eq!(SortDirection::parse("-1").unwrap(), SortDirection::Desc);
        assert_eq!(SortDirection::parse("ASC").unwrap(), SortDirection::Asc);
        assert!(SortDirection::parse("sideways").is_err());
        assert_eq!(VideoSortField::parse("views").unwrap(), VideoSortField::Views);
        assert!(VideoSortField::parse("password_hash").is_err());
    }
}
