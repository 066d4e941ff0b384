//! # Product Repository
//!
//! Product reads through the Finder and product writes through the
//! transactional Inserter.
//!
//! ## Insert Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  validate_new_product                                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN                                                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  INSERT INTO products ... RETURNING id        step "insert product"    │
//! │       │ id                                                              │
//! │       ▼                                                                 │
//! │  INSERT INTO products_categories              step "insert products_   │
//! │       │                                                categories"      │
//! │       ▼                                                                 │
//! │  INSERT INTO images VALUES (..), (..)         step "insert images"     │
//! │       │                     (skipped when there are no images)          │
//! │       ▼                                                                 │
//! │  COMMIT ──────────────► find_one(id)                                   │
//! │                                                                         │
//! │  Any step fails ──► ROLLBACK ──► StepFailed { step, source }           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use bazaar_core::filter::{Page, ProductFilter};
use bazaar_core::types::{NewProduct, Product};
use bazaar_core::validation::validate_new_product;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::config::Timeouts;
use crate::error::{DbError, DbResult};
use crate::materialize::{decode_many, decode_one};
use crate::query::find::find_one_product_sql;
use crate::query::insert::build_multi_insert;
use crate::query::{bounded, build_count_products, build_find_products, ReadPolicy};

use super::{begin, execute_on, fetch_count, fetch_document, finish};

/// Repository for product operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
    timeouts: Timeouts,
    list_policy: ReadPolicy,
}

impl ProductRepository {
    /// Creates a new ProductRepository. List reads degrade on failure.
    pub fn new(pool: SqlitePool, timeouts: Timeouts) -> Self {
        ProductRepository {
            pool,
            timeouts,
            list_policy: ReadPolicy::Degrade,
        }
    }

    /// Overrides what `find_many` and `count` do with store failures.
    pub fn with_list_policy(mut self, policy: ReadPolicy) -> Self {
        self.list_policy = policy;
        self
    }

    /// Gets one product with its category and images.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Fully populated product
    /// * `Err(DbError::NotFound)` - No product with that id
    /// * `Err(_)` - Any store or decode failure; never degraded
    pub async fn find_one(&self, id: &str) -> DbResult<Product> {
        debug!(product_id = %id, "Finding product");

        let sql = find_one_product_sql();
        let payload = bounded("find one product", self.timeouts.find_one_product, async {
            sqlx::query_scalar::<_, String>(&sql)
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(DbError::from)
        })
        .await?
        .ok_or_else(|| DbError::not_found("Product", id))?;

        decode_one("product", &payload)
    }

    /// Filtered, sorted, paged products.
    ///
    /// Store failures follow the list policy (empty list by default).
    /// A payload that does not decode is always an error.
    pub async fn find_many(&self, filter: &ProductFilter) -> DbResult<Vec<Product>> {
        let query = build_find_products(filter);
        let fetched = fetch_document(
            &self.pool,
            "find products",
            self.timeouts.find_products,
            &query,
        )
        .await;
        let payload = self.list_policy.settle("find products", fetched)?;

        let products: Vec<Product> = decode_many("products", &payload)?;
        debug!(count = products.len(), "Found products");
        Ok(products)
    }

    /// Number of products matching the filter, ignoring paging.
    pub async fn count(&self, filter: &ProductFilter) -> DbResult<u64> {
        let query = build_count_products(filter);
        let counted = fetch_count(
            &self.pool,
            "count products",
            self.timeouts.count_products,
            &query,
        )
        .await;
        self.list_policy.settle("count products", counted)
    }

    /// One page plus totals. Find and Count each build their own query.
    pub async fn find_page(&self, filter: &ProductFilter) -> DbResult<Page<Product>> {
        let (data, total) = tokio::join!(self.find_many(filter), self.count(filter));
        Ok(Page::new(data?, filter.pagination, total?))
    }

    /// Inserts a product with its category link and images atomically,
    /// then reads it back.
    pub async fn insert(&self, product: &NewProduct) -> DbResult<Product> {
        validate_new_product(product)?;

        let id = bounded(
            "insert product",
            self.timeouts.insert_product,
            self.insert_aggregate(product),
        )
        .await?;

        info!(product_id = %id, images = product.images.len(), "Inserted product");
        self.find_one(&id).await
    }

    async fn insert_aggregate(&self, product: &NewProduct) -> DbResult<String> {
        let mut tx = begin(&self.pool).await?;
        let outcome = write_product(&mut tx, product).await;
        finish(tx, "product", outcome).await
    }

    /// Deletes a product. Category link and images cascade.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(product_id = %id, "Deleting product");

        let result = bounded("delete product", self.timeouts.delete_product, async {
            sqlx::query("DELETE FROM products WHERE id = ?1")
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(DbError::from)
        })
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }
}

/// Parent, link, dependents. Returns the generated product id.
async fn write_product(conn: &mut SqliteConnection, product: &NewProduct) -> DbResult<String> {
    let id: String = sqlx::query_scalar(
        "INSERT INTO products (title, description, price_cents) VALUES (?1, ?2, ?3) RETURNING id",
    )
    .bind(product.title.trim())
    .bind(&product.description)
    .bind(product.price.cents())
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| DbError::from(e).at_step("insert product"))?;

    sqlx::query("INSERT INTO products_categories (product_id, category_id) VALUES (?1, ?2)")
        .bind(&id)
        .bind(product.category_id)
        .execute(&mut *conn)
        .await
        .map_err(|e| DbError::from(e).at_step("insert products_categories"))?;

    let rows = product
        .images
        .iter()
        .map(|image| {
            vec![
                image.filename.as_str().into(),
                image.url.as_str().into(),
                id.as_str().into(),
            ]
        })
        .collect();

    if let Some(insert) = build_multi_insert("images", &["filename", "url", "product_id"], rows) {
        execute_on(conn, &insert)
            .await
            .map_err(|e| e.at_step("insert images"))?;
    }

    Ok(id)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use bazaar_core::filter::{Pagination, SortRequest};
    use bazaar_core::types::{Category, NewImage};
    use bazaar_core::{CoreError, Money, ValidationError};

    async fn setup() -> (Database, i64) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut categories = vec![Category {
            id: 0,
            title: "Apparel".to_string(),
        }];
        db.categories().insert(&mut categories).await.unwrap();
        (db, categories[0].id)
    }

    fn new_product(title: &str, price_cents: i64, category_id: i64, images: usize) -> NewProduct {
        NewProduct {
            title: title.to_string(),
            description: format!("{title} description"),
            price: Money::from_cents(price_cents),
            category_id,
            images: (0..images)
                .map(|i| NewImage {
                    filename: format!("{title}-{i}.png"),
                    url: format!("https://cdn.example.com/{title}-{i}.png"),
                })
                .collect(),
        }
    }

    async fn count_rows(db: &Database, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_insert_then_find_one_round_trip() {
        let (db, category_id) = setup().await;
        let repo = db.products();

        let inserted = repo
            .insert(&new_product("T-Shirt", 1999, category_id, 2))
            .await
            .unwrap();
        let found = repo.find_one(&inserted.id).await.unwrap();

        assert_eq!(found.title, "T-Shirt");
        assert_eq!(found.price, Money::from_cents(1999));
        assert_eq!(found.category.id, category_id);
        assert_eq!(found.category.title, "Apparel");
        assert_eq!(found.images.len(), 2);
        assert_eq!(found.images[0].filename, "T-Shirt-0.png");
    }

    #[tokio::test]
    async fn test_insert_without_images() {
        let (db, category_id) = setup().await;

        let product = db
            .products()
            .insert(&new_product("Mug", 450, category_id, 0))
            .await
            .unwrap();

        assert!(product.images.is_empty());
        assert_eq!(count_rows(&db, "images").await, 0);
        assert_eq!(count_rows(&db, "products").await, 1);
    }

    #[tokio::test]
    async fn test_failed_category_link_rolls_back_product() {
        let (db, _) = setup().await;

        let err = db
            .products()
            .insert(&new_product("Ghost", 100, 9999, 1))
            .await
            .unwrap_err();

        match &err {
            DbError::StepFailed { step, source } => {
                assert_eq!(*step, "insert products_categories");
                assert!(matches!(**source, DbError::ForeignKeyViolation { .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().starts_with("insert products_categories failed"));
        assert_eq!(count_rows(&db, "products").await, 0);
        assert_eq!(count_rows(&db, "products_categories").await, 0);
        assert_eq!(count_rows(&db, "images").await, 0);
    }

    #[tokio::test]
    async fn test_invalid_product_rejected_before_store() {
        let (db, category_id) = setup().await;
        let err = db
            .products()
            .insert(&new_product("  ", 100, category_id, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(_)));

        let err = db
            .products()
            .insert(&new_product("Yacht", i64::MAX / 2, category_id, 0))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));
        assert_eq!(count_rows(&db, "products").await, 0);
    }

    #[tokio::test]
    async fn test_find_one_missing_is_not_found() {
        let (db, _) = setup().await;
        let err = db.products().find_one("missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_find_many_filters_sorts_and_pages() {
        let (db, category_id) = setup().await;
        let repo = db.products();
        for (title, price) in [("Cap", 900), ("Blue Shirt", 2500), ("Red Shirt", 1500)] {
            repo.insert(&new_product(title, price, category_id, 1))
                .await
                .unwrap();
        }

        let filter = ProductFilter {
            search: "SHIRT".to_string(),
            sort: SortRequest::new("price", "asc"),
            pagination: Pagination::new(1, 5),
            ..Default::default()
        };
        let found = repo.find_many(&filter).await.unwrap();
        let titles: Vec<_> = found.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Red Shirt", "Blue Shirt"]);
        assert!(found.iter().all(|p| p.images.len() == 1));
        assert_eq!(repo.count(&filter).await.unwrap(), 2);

        let by_id = ProductFilter {
            id: Some(found[0].id.clone()),
            ..Default::default()
        };
        assert_eq!(repo.count(&by_id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unknown_sort_falls_back_to_title_ascending() {
        let (db, category_id) = setup().await;
        let repo = db.products();
        for title in ["Zipper", "Apron", "Mitten"] {
            repo.insert(&new_product(title, 100, category_id, 0))
                .await
                .unwrap();
        }

        let filter = ProductFilter {
            sort: SortRequest::new("popularity", "upwards"),
            ..Default::default()
        };
        let titles: Vec<_> = repo
            .find_many(&filter)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, vec!["Apron", "Mitten", "Zipper"]);
    }

    #[tokio::test]
    async fn test_find_page_totals() {
        let (db, category_id) = setup().await;
        let repo = db.products();
        for i in 0..7 {
            repo.insert(&new_product(&format!("Item {i}"), 100, category_id, 0))
                .await
                .unwrap();
        }

        let page = repo
            .find_page(&ProductFilter {
                pagination: Pagination::new(2, 5),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.total_item, 7);
        assert_eq!(page.total_page, 2);
    }

    #[tokio::test]
    async fn test_list_reads_degrade_but_find_one_propagates() {
        let (db, _) = setup().await;
        let repo = db.products();
        db.close().await;

        let filter = ProductFilter::default();
        assert!(repo.find_many(&filter).await.unwrap().is_empty());
        assert_eq!(repo.count(&filter).await.unwrap(), 0);
        assert!(repo.find_one("anything").await.is_err());

        let strict = repo.with_list_policy(ReadPolicy::Propagate);
        assert!(strict.find_many(&filter).await.is_err());
        assert!(strict.count(&filter).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_cascades() {
        let (db, category_id) = setup().await;
        let repo = db.products();
        let product = repo
            .insert(&new_product("Scarf", 1200, category_id, 2))
            .await
            .unwrap();

        repo.delete(&product.id).await.unwrap();

        assert_eq!(count_rows(&db, "images").await, 0);
        assert_eq!(count_rows(&db, "products_categories").await, 0);
        assert!(repo.delete(&product.id).await.unwrap_err().is_not_found());
    }
}
