//! # Category Repository
//!
//! Category catalog: search, batch insert, delete.
//!
//! A batch insert is one statement inside one transaction. SQLite does
//! not promise that `RETURNING` rows come back in `VALUES` order, so
//! generated ids are matched back to the input by title (titles are
//! unique).

use std::collections::HashMap;

use bazaar_core::error::ValidationError;
use bazaar_core::filter::CategoryFilter;
use bazaar_core::types::Category;
use bazaar_core::validation::validate_title;
use sqlx::{Sqlite, SqlitePool};
use tracing::{debug, info};

use crate::config::Timeouts;
use crate::error::{DbError, DbResult};
use crate::query::buffer::SqlBuffer;
use crate::query::insert::build_multi_insert;
use crate::query::{bounded, SqlValue};

use super::{begin, finish};

#[derive(Debug, Clone, sqlx::FromRow)]
struct CategoryRecord {
    id: i64,
    title: String,
}

impl From<CategoryRecord> for Category {
    fn from(record: CategoryRecord) -> Self {
        Category {
            id: record.id,
            title: record.title,
        }
    }
}

/// Repository for category operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
    timeouts: Timeouts,
}

impl CategoryRepository {
    pub fn new(pool: SqlitePool, timeouts: Timeouts) -> Self {
        CategoryRepository { pool, timeouts }
    }

    /// Categories whose title contains `filter.title`, newest first.
    pub async fn find(&self, filter: &CategoryFilter) -> DbResult<Vec<Category>> {
        let mut buf = SqlBuffer::new();
        buf.push_sql("SELECT id, title FROM categories WHERE 1 = 1");
        let title = filter.title.trim();
        if !title.is_empty() {
            buf.append(
                " AND lower(title) LIKE ?1",
                vec![SqlValue::Text(format!("%{}%", title.to_lowercase()))],
            );
            buf.commit();
        }
        buf.push_sql(" ORDER BY id DESC");
        let query = buf.finish();
        let args = query.arguments()?;

        let records = bounded("find categories", self.timeouts.categories, async {
            sqlx::query_as_with::<Sqlite, CategoryRecord, _>(&query.sql, args)
                .fetch_all(&self.pool)
                .await
                .map_err(DbError::from)
        })
        .await?;

        debug!(count = records.len(), "Found categories");
        Ok(records.into_iter().map(Category::from).collect())
    }

    /// Inserts every category in one statement and writes the generated
    /// ids back into `categories`. All or nothing.
    pub async fn insert(&self, categories: &mut [Category]) -> DbResult<()> {
        if categories.is_empty() {
            return Err(ValidationError::Empty {
                field: "categories".to_string(),
            }
            .into());
        }
        for category in categories.iter() {
            validate_title("title", &category.title)?;
        }

        let rows = categories
            .iter()
            .map(|c| vec![SqlValue::from(c.title.trim())])
            .collect();
        let insert = build_multi_insert("categories", &["title"], rows)
            .ok_or_else(|| DbError::Internal("empty category batch".to_string()))?;
        let sql = format!("{} RETURNING id, title", insert.sql);
        let args = insert.arguments()?;

        let records = bounded("insert categories", self.timeouts.categories, async {
            let mut tx = begin(&self.pool).await?;
            let outcome = sqlx::query_as_with::<Sqlite, CategoryRecord, _>(&sql, args)
                .fetch_all(&mut *tx)
                .await
                .map_err(|e| DbError::from(e).at_step("insert categories"));
            finish(tx, "categories", outcome).await
        })
        .await?;

        let ids: HashMap<String, i64> = records.into_iter().map(|r| (r.title, r.id)).collect();
        for category in categories.iter_mut() {
            let title = category.title.trim();
            category.id = *ids
                .get(title)
                .ok_or_else(|| DbError::Internal(format!("no id returned for category {title}")))?;
        }

        info!(count = categories.len(), "Inserted categories");
        Ok(())
    }

    /// Deletes a category. Fails with a foreign key violation while any
    /// product still links to it.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let result = bounded("delete category", self.timeouts.categories, async {
            sqlx::query("DELETE FROM categories WHERE id = ?1")
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(DbError::from)
        })
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id.to_string()));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
