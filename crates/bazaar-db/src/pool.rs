//! # Pool
//!
//! Opens the shared SQLite pool and hands out repositories bound to it.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Database Connection Pool                           │
//! │                                                                         │
//! │  DbConfig::new(path) / DbConfig::from_env()                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new(config).await ← Create pool + run migrations            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────┐                           │
//! │  │            SqlitePool                    │                           │
//! │  │  ┌─────┐ ┌─────┐ ┌─────┐ ┌─────┐       │                           │
//! │  │  │Conn1│ │Conn2│ │Conn3│ │Conn4│ ...   │  (max_connections)        │
//! │  │  └─────┘ └─────┘ └─────┘ └─────┘       │                           │
//! │  └─────────────────────────────────────────┘                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Finder      ──► one connection per statement                          │
//! │  Inserter    ──► one connection held for the whole transaction         │
//! │  Saturated?  ──► callers wait in acquire() up to connect_timeout       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The pool is the only state shared between requests. Everything built on
//! top of it (buffers, transactions) lives for one call.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::{debug, info};

use crate::config::{DbConfig, Timeouts};
use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::category::CategoryRepository;
use crate::repository::order::OrderRepository;
use crate::repository::product::ProductRepository;
use crate::repository::user::UserRepository;
use crate::service::OrderService;

// =============================================================================
// Database
// =============================================================================

/// Cloneable handle on the pool plus the query bounds every repository gets.
///
/// Cheap to clone; clones share the pool.
///
/// ## Usage
/// ```rust,ignore
/// let db = Database::new(DbConfig::from_env()?).await?;
///
/// let page = db.order_service().find_orders(&filter).await?;
/// let product = db.products().find_one(&id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,

    /// Per-operation query bounds handed to every repository.
    timeouts: Timeouts,
}

impl Database {
    /// Opens the pool and, unless disabled, applies migrations.
    ///
    /// Every connection runs with WAL journaling, NORMAL sync and foreign
    /// keys on. Cascading deletes of line items, images and category links
    /// depend on the last one.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Opening SQLite pool"
        );

        let connect_options = connect_options(&config)?;
        debug!("Connect options built");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(format!("open pool: {e}")))?;

        info!(
            max_connections = config.max_connections,
            "SQLite pool ready"
        );

        let db = Database {
            pool,
            timeouts: Timeouts::default(),
        };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Replaces the per-operation query bounds.
    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Applies pending embedded migrations. Safe to call repeatedly.
    pub async fn run_migrations(&self) -> DbResult<()> {
        info!("Applying migrations");
        migrations::run_migrations(&self.pool).await?;
        info!("Schema up to date");
        Ok(())
    }

    /// Raw pool access, for ad-hoc statements in tests and tooling.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn timeouts(&self) -> &Timeouts {
        &self.timeouts
    }

    pub fn orders(&self) -> OrderRepository {
        OrderRepository::new(self.pool.clone(), self.timeouts)
    }

    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone(), self.timeouts)
    }

    pub fn categories(&self) -> CategoryRepository {
        CategoryRepository::new(self.pool.clone(), self.timeouts)
    }

    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.pool.clone(), self.timeouts)
    }

    /// Order use-cases, resolving line items through the product repository.
    pub fn order_service(&self) -> OrderService<ProductRepository> {
        OrderService::new(self.orders(), self.products())
    }

    /// Closes the database connection pool. Every later operation fails.
    pub async fn close(&self) {
        info!("Closing SQLite pool");
        self.pool.close().await;
    }

    /// Whether `SELECT 1` still succeeds.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

fn connect_options(config: &DbConfig) -> DbResult<SqliteConnectOptions> {
    let url = format!("sqlite://{}?mode=rwc", config.database_path.display());
    let options = SqliteConnectOptions::from_str(&url)
        .map_err(|e| DbError::ConnectionFailed(format!("{url}: {e}")))?
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true)
        .create_if_missing(true);
    Ok(options)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_in_memory_database() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.health_check().await);

        let (total, applied) = migrations::migration_status(db.pool()).await.unwrap();
        assert_eq!(total, applied);
        assert!(total >= 1);
    }

    #[tokio::test]
    async fn test_closed_database_is_unhealthy() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.close().await;
        assert!(!db.health_check().await);
    }

    #[test]
    fn test_config_builder() {
        let config = DbConfig::new("/tmp/test.db")
            .max_connections(10)
            .min_connections(2)
            .run_migrations(false);

        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
        assert!(!config.run_migrations);
    }

    #[tokio::test]
    async fn test_custom_timeouts_reach_repositories() {
        let timeouts = Timeouts {
            find_orders: Duration::from_secs(1),
            ..Timeouts::default()
        };
        let db = Database::new(DbConfig::in_memory())
            .await
            .unwrap()
            .with_timeouts(timeouts);
        assert_eq!(db.timeouts().find_orders, Duration::from_secs(1));
    }
}
