//! # Validation Module
//!
//! Checks that run before any store interaction.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller (handler)                                             │
//! │  ├── Deserialization into typed requests                               │
//! │  └── Default / clamp pagination                                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Dates, ranges, statuses                                           │
//! │  ├── Non-empty orders, quantities, prices                              │
//! │  └── Role-restricted status transitions                                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite                                                       │
//! │  ├── CHECK / NOT NULL constraints                                      │
//! │  ├── UNIQUE constraints (usernames, emails, category titles)           │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use bazaar_core::validation::{parse_filter_date, validate_date_range};
//!
//! let start = parse_filter_date("start_date", "2026-01-01").unwrap();
//! let end = parse_filter_date("end_date", "2026-01-31").unwrap();
//! validate_date_range(start, end).unwrap();
//! ```

use chrono::NaiveDate;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{NewOrder, NewProduct, OrderStatus, Role};
use crate::{MAX_ITEM_QUANTITY, MAX_PRICE_CENTS, MAX_SEARCH_LENGTH, MAX_TITLE_LENGTH};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Calendar-day format accepted in filters.
pub const FILTER_DATE_FORMAT: &str = "%Y-%m-%d";

// =============================================================================
// String Validators
// =============================================================================

/// Validates a title (product or category).
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most 200 characters
pub fn validate_title(field: &str, title: &str) -> ValidationResult<()> {
    let title = title.trim();

    if title.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_TITLE_LENGTH,
        });
    }

    Ok(())
}

/// Validates a free-text search term.
///
/// ## Returns
/// The trimmed term. Empty means "no text predicate".
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > MAX_SEARCH_LENGTH {
        return Err(ValidationError::TooLong {
            field: "search".to_string(),
            max: MAX_SEARCH_LENGTH,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Filter Validators
// =============================================================================

/// Parses a `YYYY-MM-DD` filter bound. An empty string means "not given".
///
/// ## Example
/// ```rust
/// use bazaar_core::validation::parse_filter_date;
///
/// assert!(parse_filter_date("start_date", "").unwrap().is_none());
/// assert!(parse_filter_date("start_date", "2026-02-30").is_err());
/// ```
pub fn parse_filter_date(field: &str, raw: &str) -> ValidationResult<Option<NaiveDate>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    NaiveDate::parse_from_str(raw, FILTER_DATE_FORMAT)
        .map(Some)
        .map_err(|e| ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: format!("expected YYYY-MM-DD ({e})"),
        })
}

/// Rejects a range whose start is after its end.
///
/// A range with a missing bound is accepted here and ignored later by the
/// predicate composer.
pub fn validate_date_range(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> ValidationResult<()> {
    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(ValidationError::InvalidRange {
                field: "start_date".to_string(),
                reason: format!("{start} is after end_date {end}"),
            });
        }
    }
    Ok(())
}

/// Parses an optional status filter. Empty means "any status".
pub fn parse_status_filter(raw: &str) -> ValidationResult<Option<OrderStatus>> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    raw.parse().map(Some)
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line-item quantity.
///
/// ## Rules
/// - Between 1 and 999 (inclusive)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if !(1..=MAX_ITEM_QUANTITY).contains(&qty) {
        return Err(ValidationError::OutOfRange {
            field: "qty".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }
    Ok(())
}

/// Validates a price in cents. Free items are not sold through this catalog.
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "price".to_string(),
        });
    }
    if cents > MAX_PRICE_CENTS {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 1,
            max: MAX_PRICE_CENTS,
        });
    }
    Ok(())
}

// =============================================================================
// Aggregate Validators
// =============================================================================

/// Validates an order request before any product lookup.
///
/// ## Rules
/// - At least one line item
/// - Every quantity within range
/// - Every line references a product id
pub fn validate_new_order(order: &NewOrder) -> ValidationResult<()> {
    if order.user_id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "user_id".to_string(),
        });
    }

    if order.products.is_empty() {
        return Err(ValidationError::Empty {
            field: "products".to_string(),
        });
    }

    for line in &order.products {
        if line.product.id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "product.id".to_string(),
            });
        }
        validate_quantity(line.qty)?;
    }

    Ok(())
}

/// Validates a product before insertion.
pub fn validate_new_product(product: &NewProduct) -> ValidationResult<()> {
    validate_title("title", &product.title)?;
    validate_price_cents(product.price.cents())?;

    if product.category_id <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "category_id".to_string(),
        });
    }

    for image in &product.images {
        if image.url.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "images.url".to_string(),
            });
        }
    }

    Ok(())
}

// =============================================================================
// Authorization
// =============================================================================

/// Checks whether `role` may move an order into `status`.
///
/// Customers may only cancel; admins may set any status.
///
/// ## Example
/// ```rust
/// use bazaar_core::types::{OrderStatus, Role};
/// use bazaar_core::validation::authorize_status_change;
///
/// assert!(authorize_status_change(Role::Customer, OrderStatus::Canceled).is_ok());
/// assert!(authorize_status_change(Role::Customer, OrderStatus::Shipping).is_err());
/// assert!(authorize_status_change(Role::Admin, OrderStatus::Shipping).is_ok());
/// ```
pub fn authorize_status_change(role: Role, status: OrderStatus) -> CoreResult<()> {
    match (role, status) {
        (Role::Admin, _) | (Role::Customer, OrderStatus::Canceled) => Ok(()),
        (Role::Customer, other) => Err(CoreError::StatusChangeForbidden {
            role: role.to_string(),
            status: other.to_string(),
        }),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
