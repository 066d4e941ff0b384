//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)      tokio::time::error::Elapsed            │
//! │       │                                  │                              │
//! │       ▼                                  ▼                              │
//! │  DbError (this module) ◄──── Timeout { operation, after }              │
//! │       │                                                                 │
//! │       ├── Inserter step failed? wrapped in StepFailed { step, .. }     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Caller maps NotFound → 404, UniqueViolation → 409, rest → 500        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use bazaar_core::{CoreError, ValidationError};
use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    ///
    /// ## When This Occurs
    /// - find-one returned no row
    /// - update/delete matched no row
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation, reported as "already in use".
    ///
    /// ## When This Occurs
    /// - Registering a taken username or email
    /// - Inserting a duplicate category title
    #[error("{field} have been used")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Linking a product to a category that does not exist
    /// - Deleting a category that products still reference
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// The pool could not be opened or has been closed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Any other statement error reported by SQLite (CHECK, syntax, ...).
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Transaction could not be opened, committed or rolled back.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// No connection became free within the acquire timeout.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// The operation exceeded its time bound and was cancelled.
    #[error("{operation} timed out after {after:?}")]
    Timeout { operation: String, after: Duration },

    /// The aggregated JSON document did not match the expected shape.
    #[error("decode {entity} failed: {reason}")]
    Decode { entity: String, reason: String },

    /// One stage of a transactional insert failed. The transaction has
    /// already been rolled back when this is returned.
    #[error("{step} failed: {source}")]
    StepFailed {
        step: &'static str,
        #[source]
        source: Box<DbError>,
    },

    /// Rejected by domain rules before touching the store.
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// Driver failures that fit no other variant.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// `NotFound` for `entity` keyed by `id`.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// `UniqueViolation` naming the column and the rejected value.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Wraps `self` as the failure of an inserter step.
    pub fn at_step(self, step: &'static str) -> Self {
        DbError::StepFailed {
            step,
            source: Box::new(self),
        }
    }

    /// True for NotFound, including one wrapped by an inserter step.
    pub fn is_not_found(&self) -> bool {
        match self {
            DbError::NotFound { .. } => true,
            DbError::StepFailed { source, .. } => source.is_not_found(),
            _ => false,
        }
    }

    /// True for a unique violation, including one wrapped by an inserter step.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            DbError::UniqueViolation { .. } => true,
            DbError::StepFailed { source, .. } => source.is_unique_violation(),
            _ => false,
        }
    }
}

/// Classifies driver errors. Constraint failures are recognised from the
/// SQLite message text, which names the violated column for UNIQUE.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                if let Some(target) = msg.split("UNIQUE constraint failed: ").nth(1) {
                    // users.username → username
                    let column = target
                        .split(',')
                        .next()
                        .and_then(|col| col.trim().rsplit('.').next())
                        .unwrap_or("unknown");
                    DbError::UniqueViolation {
                        field: column.to_string(),
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

impl From<ValidationError> for DbError {
    fn from(err: ValidationError) -> Self {
        DbError::Domain(CoreError::Validation(err))
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;
