//! # Money Module
//!
//! Prices and order totals as integer cents. SQLite stores them in INTEGER
//! columns and the aggregated JSON documents carry them as plain numbers, so
//! no value ever passes through a float.
//!
//! ```rust
//! use bazaar_core::money::Money;
//!
//! let line_total = Money::from_cents(1999).checked_multiply_quantity(2);
//! assert_eq!(line_total.map(|m| m.cents()), Some(3998));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// A monetary value in the smallest currency unit (cents).
///
/// Serializes transparently as an integer, so `{"price": 1999}` in a stored
/// JSON document decodes straight into `Money::from_cents(1999)`.
///
/// ## Where Money is Used
/// ```text
/// Product.price ──► LineItem.product (snapshot) ──► × qty ──► Order.total_paid
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Price of `qty` units, or `None` when it does not fit in an i64.
    ///
    /// ```rust
    /// use bazaar_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(1000).checked_multiply_quantity(2), Some(Money::from_cents(2000)));
    /// assert_eq!(Money::from_cents(i64::MAX).checked_multiply_quantity(2), None);
    /// ```
    #[inline]
    pub const fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }
}

/// Renders as `$major.minor`, for log lines only.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}${}.{:02}", abs / 100, abs % 100)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
