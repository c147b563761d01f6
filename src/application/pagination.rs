//! Offset pagination and sorting parameters for article lists.

use std::{fmt, str::FromStr};

use thiserror::Error;

use crate::config::PaginationSettings;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaginationError {
    #[error("page must be at least 1")]
    InvalidPage,
    #[error("page_size must be at least 1")]
    InvalidPageSize,
    #[error("sort_order must be `asc` or `desc`, got `{0}`")]
    InvalidSortOrder(String),
}

/// Columns an article list can be ordered by.
///
/// Unknown names resolve to [`SortField::CreatedAt`], so every accepted
/// request maps onto one of these four values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortField {
    #[default]
    CreatedAt,
    PublishedAt,
    ViewCount,
    Title,
}

impl SortField {
    pub fn resolve(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("published_at") => Self::PublishedAt,
            Some("view_count") => Self::ViewCount,
            Some("title") => Self::Title,
            _ => Self::CreatedAt,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::PublishedAt => "published_at",
            Self::ViewCount => "view_count",
            Self::Title => "title",
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl FromStr for SortOrder {
    type Err = PaginationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(PaginationError::InvalidSortOrder(other.to_string())),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Page size bounds applied to incoming list requests.
#[derive(Debug, Clone, Copy)]
pub struct PageLimits {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

impl From<&PaginationSettings> for PageLimits {
    fn from(settings: &PaginationSettings) -> Self {
        Self {
            default_page_size: settings.default_page_size.get(),
            max_page_size: settings.max_page_size.get(),
        }
    }
}

/// Validated list request. Every field participates in the list cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListParams {
    pub page: u32,
    pub page_size: u32,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: PageLimits::default().default_page_size,
            sort_by: SortField::default(),
            sort_order: SortOrder::default(),
        }
    }
}

impl ListParams {
    /// Validate raw query values. `page_size` above the ceiling is clamped, not rejected.
    pub fn parse(
        page: Option<u32>,
        page_size: Option<u32>,
        sort_by: Option<&str>,
        sort_order: Option<&str>,
        limits: PageLimits,
    ) -> Result<Self, PaginationError> {
        let page = page.unwrap_or(1);
        if page == 0 {
            return Err(PaginationError::InvalidPage);
        }

        let page_size = page_size.unwrap_or(limits.default_page_size);
        if page_size == 0 {
            return Err(PaginationError::InvalidPageSize);
        }

        let sort_order = match sort_order {
            Some(raw) => raw.parse()?,
            None => SortOrder::default(),
        };

        Ok(Self {
            page,
            page_size: page_size.min(limits.max_page_size),
            sort_by: SortField::resolve(sort_by),
            sort_order,
        })
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.page_size)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    /// Number of pages needed for `total` rows; zero when there are none.
    pub fn pages_for(&self, total: u64) -> u64 {
        total.div_ceil(u64::from(self.page_size))
    }
}
