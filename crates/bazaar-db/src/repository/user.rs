//! # User Repository
//!
//! Account registration and lookup. Password hashing happens before the
//! repository is called; only the hash is stored and it is never read back.

use bazaar_core::error::ValidationError;
use bazaar_core::types::{NewUser, Role, User};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::config::Timeouts;
use crate::error::{DbError, DbResult};
use crate::query::bounded;

#[derive(Debug, Clone, sqlx::FromRow)]
struct UserRecord {
    id: String,
    email: String,
    username: String,
    #[sqlx(rename = "role_id")]
    role: Role,
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        User {
            id: record.id,
            email: record.email,
            username: record.username,
            role: record.role,
        }
    }
}

/// Repository for user operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
    timeouts: Timeouts,
}

impl UserRepository {
    pub fn new(pool: SqlitePool, timeouts: Timeouts) -> Self {
        UserRepository { pool, timeouts }
    }

    /// Registers a user.
    ///
    /// ## Returns
    /// * `Ok(User)` - Stored user with its generated id
    /// * `Err(DbError::UniqueViolation)` - Email or username taken,
    ///   e.g. "username have been used"
    pub async fn insert(&self, new: &NewUser) -> DbResult<User> {
        validate_new_user(new)?;

        let email = new.email.trim();
        let username = new.username.trim();

        let record = bounded("insert user", self.timeouts.insert_user, async {
            sqlx::query_as::<_, UserRecord>(
                "INSERT INTO users (email, password, username, role_id)
                 VALUES (?1, ?2, ?3, ?4)
                 RETURNING id, email, username, role_id",
            )
            .bind(email)
            .bind(&new.password_hash)
            .bind(username)
            .bind(new.role)
            .fetch_one(&self.pool)
            .await
            .map_err(DbError::from)
        })
        .await
        .map_err(|e| match e {
            DbError::UniqueViolation { field, .. } => {
                let value = if field == "email" { email } else { username };
                DbError::duplicate(field, value)
            }
            other => other,
        })?;

        info!(user_id = %record.id, role = %record.role, "Inserted user");
        Ok(record.into())
    }

    /// Gets a user by id.
    pub async fn find_by_id(&self, id: &str) -> DbResult<User> {
        debug!(user_id = %id, "Finding user");

        let record = bounded("find user", self.timeouts.insert_user, async {
            sqlx::query_as::<_, UserRecord>(
                "SELECT id, email, username, role_id FROM users WHERE id = ?1",
            )
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::from)
        })
        .await?
        .ok_or_else(|| DbError::not_found("User", id))?;

        Ok(record.into())
    }
}

fn validate_new_user(new: &NewUser) -> Result<(), ValidationError> {
    for (field, value) in [
        ("email", &new.email),
        ("username", &new.username),
        ("password", &new.password_hash),
    ] {
        if value.trim().is_empty() {
            return Err(ValidationError::Required {
                field: field.to_string(),
            });
        }
    }

    if !new.email.contains('@') {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "missing '@'".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
