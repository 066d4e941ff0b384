//! Storage configuration.
//!
//! Pool settings are loaded from environment variables with fallback to
//! defaults. Per-operation query bounds live in [`Timeouts`].
//!
//! ```text
//! BAZAAR_DB_PATH                  bazaar.db
//! BAZAAR_DB_MAX_CONNECTIONS       5
//! BAZAAR_DB_MIN_CONNECTIONS       1      (must not exceed max)
//! BAZAAR_DB_CONNECT_TIMEOUT_SECS  30     (wait for a free connection)
//! ```

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Database file path.
pub const ENV_DB_PATH: &str = "BAZAAR_DB_PATH";
/// Pool upper bound.
pub const ENV_MAX_CONNECTIONS: &str = "BAZAAR_DB_MAX_CONNECTIONS";
/// Connections kept warm.
pub const ENV_MIN_CONNECTIONS: &str = "BAZAAR_DB_MIN_CONNECTIONS";
/// Seconds to wait for a free connection.
pub const ENV_CONNECT_TIMEOUT_SECS: &str = "BAZAAR_DB_CONNECT_TIMEOUT_SECS";

const DEFAULT_DB_PATH: &str = "bazaar.db";

// =============================================================================
// Pool Configuration
// =============================================================================

/// Pool settings handed to [`Database::new`](crate::Database::new).
///
/// ```rust,ignore
/// let config = DbConfig::new("/var/lib/bazaar/bazaar.db")
///     .max_connections(10)
///     .connect_timeout(Duration::from_secs(5));
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// SQLite file, created on first connect.
    pub database_path: PathBuf,
    /// Pool admission limit. Saturated callers wait up to `connect_timeout`.
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: Duration,
    pub idle_timeout: Duration,
    /// Apply embedded migrations in `Database::new`.
    pub run_migrations: bool,
}

impl DbConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            run_migrations: true,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Private in-memory database with migrations applied, for tests.
    ///
    /// A single connection: every extra connection to `:memory:` would
    /// open its own empty database.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            run_migrations: true,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = lookup(ENV_DB_PATH).unwrap_or_else(|| DEFAULT_DB_PATH.to_string());
        let mut config = DbConfig::new(path);

        if let Some(raw) = lookup(ENV_MAX_CONNECTIONS) {
            config = config.max_connections(parse_number(ENV_MAX_CONNECTIONS, &raw)?);
        }
        if let Some(raw) = lookup(ENV_MIN_CONNECTIONS) {
            config = config.min_connections(parse_number(ENV_MIN_CONNECTIONS, &raw)?);
        }
        if let Some(raw) = lookup(ENV_CONNECT_TIMEOUT_SECS) {
            let secs: u64 = parse_number(ENV_CONNECT_TIMEOUT_SECS, &raw)?;
            config = config.connect_timeout(Duration::from_secs(secs));
        }

        if config.max_connections == 0 {
            return Err(ConfigError::InvalidValue(ENV_MAX_CONNECTIONS.to_string()));
        }
        if config.min_connections > config.max_connections {
            return Err(ConfigError::Inconsistent(format!(
                "{ENV_MIN_CONNECTIONS} ({}) exceeds {ENV_MAX_CONNECTIONS} ({})",
                config.min_connections, config.max_connections
            )));
        }

        Ok(config)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(key.to_string()))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Inconsistent configuration: {0}")]
    Inconsistent(String),
}

// =============================================================================
// Query Timeouts
// =============================================================================

/// Upper bound for each store operation. Expiry cancels the statement and
/// surfaces [`DbError::Timeout`](crate::DbError::Timeout); nothing is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub find_orders: Duration,
    pub count_orders: Duration,
    pub find_one_order: Duration,
    pub insert_order: Duration,
    pub update_order: Duration,
    pub find_products: Duration,
    pub count_products: Duration,
    pub find_one_product: Duration,
    pub insert_product: Duration,
    pub delete_product: Duration,
    pub categories: Duration,
    pub insert_user: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Timeouts {
            find_orders: Duration::from_secs(30),
            count_orders: Duration::from_secs(15),
            find_one_order: Duration::from_secs(15),
            insert_order: Duration::from_secs(10),
            update_order: Duration::from_secs(15),
            find_products: Duration::from_secs(15),
            count_products: Duration::from_secs(15),
            find_one_product: Duration::from_secs(10),
            insert_product: Duration::from_secs(15),
            delete_product: Duration::from_secs(10),
            categories: Duration::from_secs(5),
            insert_user: Duration::from_secs(5),
        }
    }
}
