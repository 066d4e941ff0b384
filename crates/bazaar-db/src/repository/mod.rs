//! # Repository Module
//!
//! Storage access for the Bazaar aggregates.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Caller / OrderService                                                 │
//! │       │                                                                 │
//! │       │  db.orders().find_many(&filter)                                │
//! │       ▼                                                                 │
//! │  OrderRepository / ProductRepository                                   │
//! │  ├── find_one(id)        Propagate   ── NotFound on no row             │
//! │  ├── find_many(filter)   Degrade     ── [] on store failure            │
//! │  ├── count(filter)       Degrade     ── 0 on store failure             │
//! │  └── insert(aggregate)   Transaction ── parent + dependents or nothing │
//! │       │                                                                 │
//! │       │  BuiltQuery { sql, values }                                    │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`OrderRepository`](order::OrderRepository) - Orders, line items, partial updates
//! - [`ProductRepository`](product::ProductRepository) - Products, category links, images
//! - [`CategoryRepository`](category::CategoryRepository) - Category catalog
//! - [`UserRepository`](user::UserRepository) - Account registration

use std::time::Duration;

use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use crate::query::{bounded, BuiltQuery};

pub mod category;
pub mod order;
pub mod product;
pub mod user;

// =============================================================================
// Read Helpers
// =============================================================================

/// Runs a query that yields one JSON document (an aggregated array).
pub(crate) async fn fetch_document(
    pool: &SqlitePool,
    operation: &str,
    limit: Duration,
    query: &BuiltQuery,
) -> DbResult<String> {
    let args = query.arguments()?;
    bounded(operation, limit, async {
        sqlx::query_scalar_with::<Sqlite, Option<String>, _>(&query.sql, args)
            .fetch_one(pool)
            .await
            .map(Option::unwrap_or_default)
            .map_err(DbError::from)
    })
    .await
}

/// Runs a `SELECT COUNT(*)` query.
pub(crate) async fn fetch_count(
    pool: &SqlitePool,
    operation: &str,
    limit: Duration,
    query: &BuiltQuery,
) -> DbResult<u64> {
    let args = query.arguments()?;
    let count = bounded(operation, limit, async {
        sqlx::query_scalar_with::<Sqlite, i64, _>(&query.sql, args)
            .fetch_one(pool)
            .await
            .map_err(DbError::from)
    })
    .await?;
    Ok(u64::try_from(count).unwrap_or(0))
}

// =============================================================================
// Transaction Helpers
// =============================================================================

/// Opens a transaction. The connection stays checked out until
/// [`finish`] commits or rolls back.
pub(crate) async fn begin(pool: &SqlitePool) -> DbResult<Transaction<'static, Sqlite>> {
    pool.begin()
        .await
        .map_err(|e| DbError::TransactionFailed(format!("begin: {e}")))
}

/// Commits on success. On failure rolls back first and then returns
/// the step error unchanged. The transaction never outlives this call.
pub(crate) async fn finish<T>(
    tx: Transaction<'static, Sqlite>,
    aggregate: &str,
    outcome: DbResult<T>,
) -> DbResult<T> {
    match outcome {
        Ok(value) => {
            tx.commit()
                .await
                .map_err(|e| DbError::TransactionFailed(format!("commit {aggregate}: {e}")))?;
            debug!(aggregate = %aggregate, "Transaction committed");
            Ok(value)
        }
        Err(e) => {
            warn!(aggregate = %aggregate, error = %e, "Rolling back transaction");
            if let Err(rollback_err) = tx.rollback().await {
                warn!(aggregate = %aggregate, error = %rollback_err, "Rollback failed");
            }
            Err(e)
        }
    }
}

/// Executes a built statement on a transaction's connection.
pub(crate) async fn execute_on(conn: &mut SqliteConnection, query: &BuiltQuery) -> DbResult<u64> {
    let args = query.arguments()?;
    let result = sqlx::query_with(&query.sql, args)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}
