//! This modules defines the common functionality for paging data.

use crate::Error;

/// The config for pagination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationConfig {
    /// The zero-based page index to default to when not specified in a request.
    pub default_page_index: u64,
    /// The number of items per page when not specified in a request.
    pub default_page_size: u64,
    /// The largest page size a client may request.
    pub max_page_size: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_index: 0,
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

/// A validated page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// The zero-based index of the page.
    pub index: u64,
    /// The maximum number of items on the page, never zero.
    pub size: u64,
}

impl Page {
    /// Create a page request, falling back to the defaults in `config` for
    /// missing values and capping the size at [PaginationConfig::max_page_size].
    ///
    /// # Errors
    /// Returns [Error::Validation] if the page size is zero or if the page
    /// offset does not fit in a 64-bit signed integer.
    pub fn new(
        index: Option<u64>,
        size: Option<u64>,
        config: &PaginationConfig,
    ) -> Result<Self, Error> {
        let index = index.unwrap_or(config.default_page_index);
        let size = size
            .unwrap_or(config.default_page_size)
            .min(config.max_page_size);

        if size == 0 {
            return Err(Error::Validation(
                "pageSize must be greater than zero".to_owned(),
            ));
        }

        let page = Self { index, size };
        page.offset()?;

        Ok(page)
    }

    /// The number of items to skip to get to this page.
    ///
    /// # Errors
    /// Returns [Error::Validation] if the offset overflows.
    pub fn offset(&self) -> Result<i64, Error> {
        self.index
            .checked_mul(self.size)
            .and_then(|offset| i64::try_from(offset).ok())
            .ok_or_else(|| Error::Validation("pageIndex is too large".to_owned()))
    }

    /// The page size as a SQL `LIMIT` value.
    pub fn limit(&self) -> i64 {
        i64::try_from(self.size).unwrap_or(i64::MAX)
    }
}

/// The number of pages needed to show `total_count` items, `page_size` at a time.
///
/// `page_size` must not be zero.
pub fn page_count(total_count: u64, page_size: u64) -> u64 {
    total_count.div_ceil(page_size)
}
