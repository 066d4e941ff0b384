//! # Domain Types
//!
//! Entities of the commerce backend.
//!
//! ## Aggregates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           Aggregate Roots                               │
//! │                                                                         │
//! │  ┌───────────────────────┐            ┌───────────────────────┐        │
//! │  │        Order          │            │       Product         │        │
//! │  │  ───────────────────  │            │  ───────────────────  │        │
//! │  │  status, address      │            │  title, price         │        │
//! │  │  transfer_slip?       │            │  category ────────────┼──► 1   │
//! │  │  products ────────────┼──► N       │  images ──────────────┼──► N   │
//! │  │  total_paid           │  LineItem  │                       │  Image │
//! │  └───────────────────────┘  (qty +    └───────────────────────┘        │
//! │                              product                                    │
//! │                              snapshot)                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Dependents (line items, images, category links) never exist without their
//! parent and are always written in the parent's transaction.
//!
//! ## Read vs Write Shapes
//! Read shapes (`Order`, `Product`) are fully populated by the store.
//! Write shapes (`NewProduct`, `OrderDraft`, `OrderPatch`) carry only what
//! the caller is allowed to decide.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Order Status
// =============================================================================

/// Lifecycle of an order.
///
/// ```text
/// Waiting ──► Shipping ──► Completed
///    │
///    └──────► Canceled   (the only transition a customer may request)
/// ```
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Waiting,
    Shipping,
    Completed,
    Canceled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Waiting,
        OrderStatus::Shipping,
        OrderStatus::Completed,
        OrderStatus::Canceled,
    ];

    /// Stored and wire representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Waiting => "waiting",
            OrderStatus::Shipping => "shipping",
            OrderStatus::Completed => "completed",
            OrderStatus::Canceled => "canceled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == wanted)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: OrderStatus::ALL.iter().map(|s| s.as_str().to_string()).collect(),
            })
    }
}

// =============================================================================
// Role
// =============================================================================

/// Caller role. Stored as its integer id in `users.role_id`.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i32)]
pub enum Role {
    Customer = 1,
    Admin = 2,
}

impl Role {
    pub const fn id(&self) -> i32 {
        *self as i32
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Customer => f.write_str("customer"),
            Role::Admin => f.write_str("admin"),
        }
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// Product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(default)]
    pub id: i64,
    pub title: String,
}

/// Image attachment of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub id: String,
    pub filename: String,
    pub url: String,
}

/// Image to attach when a product is inserted. The file itself is already
/// stored elsewhere; only its name and public URL are recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewImage {
    pub filename: String,
    pub url: String,
}

/// A catalog product as read back from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub title: String,
    pub description: String,
    pub price: Money,
    pub category: Category,
    /// Always present; a product without attachments decodes to `[]`.
    #[serde(default)]
    pub images: Vec<Image>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Write shape for the product inserter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub title: String,
    pub description: String,
    pub price: Money,
    pub category_id: i64,
    #[serde(default)]
    pub images: Vec<NewImage>,
}

// =============================================================================
// Orders
// =============================================================================

/// Proof of payment attached to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferSlip {
    pub id: String,
    pub filename: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

/// A line item: quantity plus the product exactly as it was when ordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: String,
    pub qty: i64,
    pub product: Product,
}

/// An order as read back from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub transfer_slip: Option<TransferSlip>,
    /// Always present; decodes to `[]` when the order has no line items.
    #[serde(default)]
    pub products: Vec<LineItem>,
    pub address: String,
    pub contact: String,
    pub status: OrderStatus,
    pub total_paid: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The caller's reference to a product inside a new order.
///
/// Only `id` is trusted. Whatever price the client believed in is kept for
/// diagnostics and never used for totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRef {
    pub id: String,
    #[serde(default)]
    pub price: Option<Money>,
}

/// One requested line of a new order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub qty: i64,
    pub product: ProductRef,
}

/// A customer's order request, before catalog resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub user_id: String,
    pub address: String,
    pub contact: String,
    pub products: Vec<OrderLine>,
}

/// A line item ready for insertion: quantity plus authoritative snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItemDraft {
    pub qty: i64,
    pub product: Product,
}

impl LineItemDraft {
    /// Snapshot price × quantity, `None` on overflow.
    #[inline]
    pub fn line_total(&self) -> Option<Money> {
        self.product.price.checked_multiply_quantity(self.qty)
    }
}

/// Write shape for the order inserter.
///
/// Built only through [`OrderDraft::new`], which pins the status to
/// `waiting` and derives the total from the snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderDraft {
    pub user_id: String,
    pub address: String,
    pub contact: String,
    pub status: OrderStatus,
    pub transfer_slip: Option<TransferSlip>,
    pub line_items: Vec<LineItemDraft>,
    pub total_paid: Money,
}

impl OrderDraft {
    pub fn new(
        user_id: impl Into<String>,
        address: impl Into<String>,
        contact: impl Into<String>,
        line_items: Vec<LineItemDraft>,
    ) -> Result<Self, ValidationError> {
        let total_paid = line_items
            .iter()
            .try_fold(Money::zero(), |total, line| {
                line.line_total()?.checked_add(total)
            })
            .ok_or_else(|| ValidationError::OutOfRange {
                field: "total_paid".to_string(),
                min: 0,
                max: i64::MAX,
            })?;
        Ok(OrderDraft {
            user_id: user_id.into(),
            address: address.into(),
            contact: contact.into(),
            status: OrderStatus::Waiting,
            transfer_slip: None,
            line_items,
            total_paid,
        })
    }
}

/// Transfer slip as uploaded by a client. A missing id is generated on update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferSlipUpload {
    #[serde(default)]
    pub id: Option<String>,
    pub filename: String,
    pub url: String,
}

/// Raw update request as received from a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateOrderRequest {
    pub order_id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub transfer_slip: Option<TransferSlipUpload>,
}

/// Validated partial update. `None` fields are left untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderPatch {
    pub order_id: String,
    pub status: Option<OrderStatus>,
    pub transfer_slip: Option<TransferSlip>,
}

impl OrderPatch {
    /// True when the patch would not change any column.
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.transfer_slip.is_none()
    }
}

// =============================================================================
// Users
// =============================================================================

/// Account as exposed to callers. The password hash never leaves the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub username: String,
    pub role: Role,
}

/// Registration request. `password_hash` is produced by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub username: String,
    pub role: Role,
}

// =============================================================================
// Unit Tests
// =============================================================================
