//! # bazaar-db: Storage Layer for Bazaar
//!
//! Query construction, JSON materialization and the transactional write
//! pipelines for orders and products, on SQLite through sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Bazaar Data Flow                                 │
//! │                                                                         │
//! │  HTTP handler / CLI (outside this workspace)                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    bazaar-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   OrderService ──► Repositories ──► query (SqlBuffer, Finder,  │   │
//! │  │                        │                    Update, Insert)     │   │
//! │  │                        ▼                                        │   │
//! │  │                    materialize (JSON payload → domain types)    │   │
//! │  │                                                                 │   │
//! │  │   Database (pool.rs) ── SqlitePool, Timeouts, migrations        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database (WAL, foreign keys on)                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`config`] - Environment configuration and per-operation timeouts
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`query`] - Parameterized SQL construction
//! - [`materialize`] - JSON payload decoding
//! - [`repository`] - Repository implementations (order, product, category, user)
//! - [`service`] - Order placement and order updates
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bazaar_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::from_env()?).await?;
//! let page = db.order_service().find_orders(&filter).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod materialize;
pub mod migrations;
pub mod pool;
pub mod query;
pub mod repository;
pub mod service;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ConfigError, DbConfig, Timeouts};
pub use error::{DbError, DbResult};
pub use pool::Database;
pub use query::{BuiltQuery, ReadPolicy, SqlValue};
pub use service::{OrderService, ProductLookup};

// Repository re-exports for convenience
pub use repository::category::CategoryRepository;
pub use repository::order::OrderRepository;
pub use repository::product::ProductRepository;
pub use repository::user::UserRepository;
