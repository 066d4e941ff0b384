//! # Filter Criteria
//!
//! Immutable inputs to one read. Callers are expected to normalize them,
//! and the storage layer normalizes again before building SQL.
//!
//! ```text
//! OrderFilter ─┬─ search ────────► LIKE over user_id / address / contact
//!              ├─ status ────────► status = ?
//!              ├─ start/end ─────► created_at BETWEEN (both bounds only)
//!              ├─ sort ──────────► ORDER BY <allow-listed column> <dir>
//!              └─ pagination ────► LIMIT size OFFSET (page-1)*size
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::OrderStatus;
use crate::validation::{
    parse_filter_date, parse_status_filter, validate_date_range, validate_search_query,
    ValidationResult,
};

/// Smallest page number.
pub const MIN_PAGE: u32 = 1;

/// Smallest page size. Anything below is raised to this.
pub const MIN_PAGE_SIZE: u32 = 5;

// =============================================================================
// Pagination
// =============================================================================

/// Page number and page size, both 1-based and clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub size: u32,
}

impl Pagination {
    /// Clamps `page` to at least 1 and `size` to at least 5.
    ///
    /// ## Example
    /// ```rust
    /// use bazaar_core::filter::Pagination;
    ///
    /// let p = Pagination::new(0, 2);
    /// assert_eq!((p.page, p.size), (1, 5));
    /// ```
    pub fn new(page: u32, size: u32) -> Self {
        Pagination {
            page: page.max(MIN_PAGE),
            size: size.max(MIN_PAGE_SIZE),
        }
    }

    /// Re-applies the minimums. Public fields may have been set directly.
    pub fn normalized(self) -> Self {
        Pagination::new(self.page, self.size)
    }

    /// Rows to skip: `(page - 1) * size`.
    pub fn offset(&self) -> i64 {
        let p = self.normalized();
        (i64::from(p.page) - 1) * i64::from(p.size)
    }

    /// Rows to return.
    pub fn limit(&self) -> i64 {
        i64::from(self.normalized().size)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination::new(MIN_PAGE, MIN_PAGE_SIZE)
    }
}

// =============================================================================
// Sorting
// =============================================================================

/// Requested sort, exactly as the caller sent it.
///
/// Both fields are free text; the storage layer maps them onto an
/// allow-list and falls back to defaults for anything it does not know.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortRequest {
    #[serde(default)]
    pub order_by: String,
    #[serde(default)]
    pub direction: String,
}

impl SortRequest {
    pub fn new(order_by: impl Into<String>, direction: impl Into<String>) -> Self {
        SortRequest {
            order_by: order_by.into(),
            direction: direction.into(),
        }
    }
}

// =============================================================================
// Order Filter
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFilter {
    pub search: String,
    pub status: Option<OrderStatus>,
    /// Only honoured together with `end_date`.
    pub start_date: Option<NaiveDate>,
    /// Inclusive: the whole calendar day is matched.
    pub end_date: Option<NaiveDate>,
    pub sort: SortRequest,
    pub pagination: Pagination,
}

/// Order list parameters as they arrive from a query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderQuery {
    pub search: String,
    pub status: String,
    pub start_date: String,
    pub end_date: String,
    pub order_by: String,
    pub direction: String,
    pub page: u32,
    pub size: u32,
}

impl OrderFilter {
    /// Validates raw parameters into a filter.
    ///
    /// ## Errors
    /// - search longer than the limit
    /// - unknown status
    /// - a date that is not `YYYY-MM-DD`, or start after end
    pub fn from_query(query: &OrderQuery) -> ValidationResult<Self> {
        let start_date = parse_filter_date("start_date", &query.start_date)?;
        let end_date = parse_filter_date("end_date", &query.end_date)?;
        validate_date_range(start_date, end_date)?;

        Ok(OrderFilter {
            search: validate_search_query(&query.search)?,
            status: parse_status_filter(&query.status)?,
            start_date,
            end_date,
            sort: SortRequest::new(query.order_by.as_str(), query.direction.as_str()),
            pagination: Pagination::new(query.page, query.size),
        })
    }
}

// =============================================================================
// Product Filter
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub id: Option<String>,
    pub search: String,
    pub sort: SortRequest,
    pub pagination: Pagination,
}

/// Product list parameters as they arrive from a query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductQuery {
    pub id: String,
    pub search: String,
    pub order_by: String,
    pub direction: String,
    pub page: u32,
    pub size: u32,
}

impl ProductFilter {
    pub fn from_query(query: &ProductQuery) -> ValidationResult<Self> {
        let id = query.id.trim();
        Ok(ProductFilter {
            id: (!id.is_empty()).then(|| id.to_string()),
            search: validate_search_query(&query.search)?,
            sort: SortRequest::new(query.order_by.as_str(), query.direction.as_str()),
            pagination: Pagination::new(query.page, query.size),
        })
    }
}

// =============================================================================
// Category Filter
// =============================================================================

/// Case-insensitive substring match on the category title.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryFilter {
    pub title: String,
}

// =============================================================================
// Page Envelope
// =============================================================================

/// One page of results plus totals for the whole filtered set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_page: u32,
    pub total_item: u64,
}

impl<T> Page<T> {
    /// `total_page` is `ceil(total_item / size)`.
    pub fn new(data: Vec<T>, pagination: Pagination, total_item: u64) -> Self {
        let pagination = pagination.normalized();
        let size = u64::from(pagination.size);
        let total_page = total_item.div_ceil(size);
        Page {
            data,
            page: pagination.page,
            size: pagination.size,
            total_page: u32::try_from(total_page).unwrap_or(u32::MAX),
            total_item,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_clamps() {
        let p = Pagination::new(0, 1);
        assert_eq!(p.page, 1);
        assert_eq!(p.size, 5);
    }

    #[test]
    fn test_offset_and_limit() {
        for page in 1..=4u32 {
            for size in [5u32, 10, 25] {
                let p = Pagination::new(page, size);
                assert_eq!(p.offset(), i64::from((page - 1) * size));
                assert_eq!(p.limit(), i64::from(size));
            }
        }
    }

    #[test]
    fn test_unnormalized_fields_are_clamped_on_use() {
        let p = Pagination { page: 0, size: 0 };
        assert_eq!(p.offset(), 0);
        assert_eq!(p.limit(), 5);
    }

    #[test]
    fn test_order_query_parsing() {
        let query = OrderQuery {
            search: "  oak ".to_string(),
            status: "Shipping".to_string(),
            start_date: "2026-01-01".to_string(),
            end_date: "2026-01-31".to_string(),
            order_by: "created_at".to_string(),
            direction: "asc".to_string(),
            page: 0,
            size: 0,
        };
        let filter = OrderFilter::from_query(&query).unwrap();
        assert_eq!(filter.search, "oak");
        assert_eq!(filter.status, Some(OrderStatus::Shipping));
        assert_eq!(filter.start_date, NaiveDate::from_ymd_opt(2026, 1, 1));
        assert_eq!(filter.pagination, Pagination::new(1, 5));

        let empty = OrderFilter::from_query(&OrderQuery::default()).unwrap();
        assert_eq!(empty.status, None);
        assert_eq!(empty.start_date, None);
    }

    #[test]
    fn test_order_query_rejects_bad_input() {
        let reversed = OrderQuery {
            start_date: "2026-02-01".to_string(),
            end_date: "2026-01-01".to_string(),
            ..Default::default()
        };
        assert!(OrderFilter::from_query(&reversed).is_err());

        let bad_status = OrderQuery {
            status: "lost".to_string(),
            ..Default::default()
        };
        assert!(OrderFilter::from_query(&bad_status).is_err());

        let bad_date = OrderQuery {
            end_date: "31/01/2026".to_string(),
            ..Default::default()
        };
        assert!(OrderFilter::from_query(&bad_date).is_err());
    }

    #[test]
    fn test_product_query_blank_id() {
        let filter = ProductFilter::from_query(&ProductQuery {
            id: "  ".to_string(),
            search: "mug".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(filter.id, None);
        assert_eq!(filter.search, "mug");
    }

    #[test]
    fn test_page_totals() {
        let page: Page<u8> = Page::new(vec![1, 2, 3, 4, 5], Pagination::new(1, 5), 11);
        assert_eq!(page.total_page, 3);
        assert_eq!(page.total_item, 11);

        let empty: Page<u8> = Page::new(Vec::new(), Pagination::new(1, 5), 0);
        assert_eq!(empty.total_page, 0);
    }
}
