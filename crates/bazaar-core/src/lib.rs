//! # bazaar-core: Commerce Domain for Bazaar
//!
//! Entities, money, filter criteria and validation rules. No I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Bazaar Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Callers (HTTP handlers, jobs, seed tool)           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ typed filters / aggregates             │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ bazaar-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  filter   │  │ validation│  │   │
//! │  │   │  Order    │  │   Money   │  │OrderFilter│  │   rules   │  │   │
//! │  │   │  Product  │  │  (cents)  │  │  Page<T>  │  │   roles   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  bazaar-db (Storage Layer)                      │   │
//! │  │        query composers, finders, inserters, migrations          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Aggregates (Order, Product) and their write shapes
//! - [`money`] - Money type with integer arithmetic
//! - [`filter`] - Filter criteria, pagination and the page envelope
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation and role checks
//!
//! ## Example Usage
//!
//! ```rust
//! use bazaar_core::filter::{Page, Pagination};
//!
//! let pagination = Pagination::new(2, 10);
//! assert_eq!(pagination.offset(), 10);
//!
//! let page: Page<&str> = Page::new(vec!["a"], pagination, 11);
//! assert_eq!(page.total_page, 2);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod filter;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use filter::{
    CategoryFilter, OrderFilter, OrderQuery, Page, Pagination, ProductFilter, ProductQuery,
    SortRequest,
};
pub use money::Money;
pub use types::{
    Category, Image, LineItem, LineItemDraft, NewImage, NewOrder, NewProduct, NewUser, Order,
    OrderDraft, OrderLine, OrderPatch, OrderStatus, Product, ProductRef, Role, TransferSlip,
    TransferSlipUpload, UpdateOrderRequest, User,
};

// =============================================================================
// Constants
// =============================================================================

/// Maximum quantity of a single line item.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Highest accepted catalog price, in cents.
pub const MAX_PRICE_CENTS: i64 = 1_000_000_000;

/// Maximum length of product and category titles.
pub const MAX_TITLE_LENGTH: usize = 200;

/// Maximum length of a free-text search term.
pub const MAX_SEARCH_LENGTH: usize = 100;
