//! # Query Construction
//!
//! Turns filter criteria and partial updates into parameterized SQL.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       One Query Construction                            │
//! │                                                                         │
//! │  OrderFilter / ProductFilter                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SqlBuffer::new()            fresh per Find and per Count              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  predicate::orders/products  WHERE fragments, commit after each        │
//! │       │                                                                 │
//! │       ├──── Count: wrap in SELECT COUNT(*) ──────────────┐             │
//! │       ▼                                                  │             │
//! │  sort::orders/products       ORDER BY + LIMIT/OFFSET     │             │
//! │       │                                                  │             │
//! │       ▼                                                  ▼             │
//! │  BuiltQuery { sql, values } ──► bounded(timeout, fetch) ──► materialize│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Callers never see the buffer: each `build_*` function runs the stages in
//! order and hands back a finished [`BuiltQuery`].

use std::future::Future;
use std::time::Duration;

use sqlx::sqlite::SqliteArguments;
use sqlx::Arguments;
use tracing::warn;

use crate::error::{DbError, DbResult};

pub(crate) mod buffer;
pub mod find;
pub(crate) mod insert;
pub(crate) mod predicate;
pub(crate) mod sort;
pub mod update;

pub use find::{build_count_orders, build_count_products, build_find_orders, build_find_products};
pub use sort::{OrderSortColumn, ProductSortColumn, SortDirection};
pub use update::build_order_update;

// =============================================================================
// Bound Values
// =============================================================================

/// A value bound to a positional placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    Integer(i64),
    Null,
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Integer(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(SqlValue::Null, Into::into)
    }
}

// =============================================================================
// Built Query
// =============================================================================

/// Finished SQL text with its positionally aligned values.
///
/// `?N` in `sql` refers to `values[N - 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

impl BuiltQuery {
    /// Encodes the values for `sqlx::query_with` and friends.
    pub fn arguments<'q>(&self) -> DbResult<SqliteArguments<'q>> {
        let mut args = SqliteArguments::default();
        for value in &self.values {
            let added = match value {
                SqlValue::Text(text) => args.add(text.clone()),
                SqlValue::Integer(n) => args.add(*n),
                SqlValue::Null => args.add(Option::<String>::None),
            };
            added.map_err(|e| DbError::Internal(format!("bind argument: {e}")))?;
        }
        Ok(args)
    }

    /// Placeholder numbers referenced by `sql`, in order of appearance.
    pub fn placeholders(&self) -> Vec<usize> {
        placeholder_numbers(&self.sql)
    }
}

/// Extracts every `?N` number from SQL text, skipping quoted literals.
pub(crate) fn placeholder_numbers(sql: &str) -> Vec<usize> {
    let mut found = Vec::new();
    let mut chars = sql.chars().peekable();
    let mut in_quote = false;

    while let Some(c) = chars.next() {
        match c {
            '\'' => in_quote = !in_quote,
            '?' if !in_quote => {
                let mut digits = String::new();
                while let Some(d) = chars.peek().copied().filter(char::is_ascii_digit) {
                    digits.push(d);
                    chars.next();
                }
                if let Ok(n) = digits.parse() {
                    found.push(n);
                }
            }
            _ => {}
        }
    }

    found
}

// =============================================================================
// Timeouts
// =============================================================================

/// Runs `fut` with an upper bound. Expiry drops the future, which cancels
/// the in-flight statement and releases its connection.
pub(crate) async fn bounded<T, F>(operation: &str, limit: Duration, fut: F) -> DbResult<T>
where
    F: Future<Output = DbResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(DbError::Timeout {
            operation: operation.to_string(),
            after: limit,
        }),
    }
}

// =============================================================================
// Read Policy
// =============================================================================

/// What a read does with a store failure.
///
/// ```text
/// list Find / Count ── Degrade ───► warn! + empty list / zero
/// find-one          ── Propagate ─► error reaches the caller
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadPolicy {
    /// Log and return the zero value.
    Degrade,
    /// Return the error.
    Propagate,
}

impl ReadPolicy {
    /// Applies the policy to a finished read.
    pub fn settle<T: Default>(self, operation: &str, result: DbResult<T>) -> DbResult<T> {
        match (self, result) {
            (_, Ok(value)) => Ok(value),
            (ReadPolicy::Propagate, Err(e)) => Err(e),
            (ReadPolicy::Degrade, Err(e)) => {
                warn!(operation = %operation, error = %e, "Read failed, returning empty result");
                Ok(T::default())
            }
        }
    }
}
