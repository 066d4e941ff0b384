//! # Error Types
//!
//! Domain-specific error types for bazaar-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  bazaar-core errors (this file)                                        │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input rejected before any store interaction    │
//! │                                                                         │
//! │  bazaar-db errors (separate crate)                                     │
//! │  └── DbError          - Store failures, wraps CoreError                │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → caller                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A line item references a product the catalog does not know.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// The caller's role may not move an order into the requested status.
    ///
    /// ## When This Occurs
    /// ```text
    /// Customer ── PATCH status=shipping ──► StatusChangeForbidden
    /// Customer ── PATCH status=canceled ──► allowed
    /// Admin    ── PATCH status=<any>    ──► allowed
    /// ```
    #[error("{role} may not set order status to {status}")]
    StatusChangeForbidden { role: String, status: String },

    /// Input rejected before any store interaction.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Why a request was rejected up front. Messages are shown to callers as-is.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Missing, or present but blank after trimming.
    #[error("{field} is required")]
    Required { field: String },

    /// Titles, descriptions and search terms are length-capped.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Line-item quantity outside 1..=999.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Prices and category ids.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g. a filter date that is not YYYY-MM-DD).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Two related fields contradict each other (start after end).
    #[error("{field} is invalid: {reason}")]
    InvalidRange { field: String, reason: String },

    /// Unknown order status or sort key.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// A collection that needs at least one element is empty.
    #[error("{field} must not be empty")]
    Empty { field: String },

    /// An update request that would change nothing.
    #[error("nothing to update: {reason}")]
    NothingToUpdate { reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Result of a business rule check.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
