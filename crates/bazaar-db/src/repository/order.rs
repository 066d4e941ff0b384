//! # Order Repository
//!
//! Order reads, the order Inserter and the partial update.
//!
//! ## Insert Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  OrderDraft (status = waiting, total = Σ snapshot price × qty)          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN                                                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  INSERT INTO orders ... RETURNING id          step "insert order"      │
//! │       │ id                                                              │
//! │       ▼                                                                 │
//! │  INSERT INTO products_orders                  step "insert products_   │
//! │    (order_id, qty, product) VALUES (..), (..)          orders"         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  COMMIT ──────────────► id                                             │
//! │                                                                         │
//! │  Any step fails ──► ROLLBACK ──► no order row, no line items            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each line item stores the full product document as it was when the
//! order was placed, so later catalog edits never change past orders.

use bazaar_core::error::ValidationError;
use bazaar_core::filter::{OrderFilter, Page};
use bazaar_core::types::{Order, OrderDraft, OrderPatch};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::config::Timeouts;
use crate::error::{DbError, DbResult};
use crate::materialize::{decode_many, decode_one};
use crate::query::find::find_one_order_sql;
use crate::query::insert::build_multi_insert;
use crate::query::{
    bounded, build_count_orders, build_find_orders, build_order_update, ReadPolicy, SqlValue,
};

use super::{begin, execute_on, fetch_count, fetch_document, finish};

/// Repository for order operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
    timeouts: Timeouts,
    list_policy: ReadPolicy,
}

impl OrderRepository {
    /// Creates a new OrderRepository. List reads degrade on failure.
    pub fn new(pool: SqlitePool, timeouts: Timeouts) -> Self {
        OrderRepository {
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

    /// Gets one order with its line items.
    pub async fn find_one(&self, id: &str) -> DbResult<Order> {
        debug!(order_id = %id, "Finding order");

        let sql = find_one_order_sql();
        let payload = bounded("find one order", self.timeouts.find_one_order, async {
            sqlx::query_scalar::<_, String>(&sql)
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(DbError::from)
        })
        .await?
        .ok_or_else(|| DbError::not_found("Order", id))?;

        decode_one("order", &payload)
    }

    /// Filtered, sorted, paged orders.
    ///
    /// ## Failure Handling
    /// ```text
    /// store error / timeout ──► list policy (default: warn! + [])
    /// malformed payload     ──► DbError::Decode, always
    /// ```
    pub async fn find_many(&self, filter: &OrderFilter) -> DbResult<Vec<Order>> {
        let query = build_find_orders(filter);
        let fetched =
            fetch_document(&self.pool, "find orders", self.timeouts.find_orders, &query).await;
        let payload = self.list_policy.settle("find orders", fetched)?;

        let orders: Vec<Order> = decode_many("orders", &payload)?;
        debug!(count = orders.len(), "Found orders");
        Ok(orders)
    }

    /// Number of orders matching the filter, ignoring paging.
    pub async fn count(&self, filter: &OrderFilter) -> DbResult<u64> {
        let query = build_count_orders(filter);
        let counted =
            fetch_count(&self.pool, "count orders", self.timeouts.count_orders, &query).await;
        self.list_policy.settle("count orders", counted)
    }

    /// One page plus totals.
    pub async fn find_page(&self, filter: &OrderFilter) -> DbResult<Page<Order>> {
        let (data, total) = tokio::join!(self.find_many(filter), self.count(filter));
        Ok(Page::new(data?, filter.pagination, total?))
    }

    /// Writes the order and all its line items in one transaction.
    ///
    /// ## Returns
    /// * `Ok(String)` - Generated order id
    /// * `Err(DbError::StepFailed)` - Named step failed; nothing was written
    pub async fn insert(&self, draft: &OrderDraft) -> DbResult<String> {
        if draft.line_items.is_empty() {
            return Err(ValidationError::Empty {
                field: "products".to_string(),
            }
            .into());
        }

        let id = bounded("insert order", self.timeouts.insert_order, async {
            let mut tx = begin(&self.pool).await?;
            let outcome = write_order(&mut tx, draft).await;
            finish(tx, "order", outcome).await
        })
        .await?;

        info!(
            order_id = %id,
            line_items = draft.line_items.len(),
            total_paid = %draft.total_paid,
            "Inserted order"
        );
        Ok(id)
    }

    /// Applies a partial update. Only the fields present in the patch are
    /// written; `updated_at` is always refreshed.
    pub async fn update(&self, patch: &OrderPatch) -> DbResult<()> {
        let query = build_order_update(patch)?;
        let args = query.arguments()?;

        let result = bounded("update order", self.timeouts.update_order, async {
            sqlx::query_with(&query.sql, args)
                .execute(&self.pool)
                .await
                .map_err(DbError::from)
        })
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", &patch.order_id));
        }

        debug!(order_id = %patch.order_id, "Updated order");
        Ok(())
    }
}

/// Order row then line items. Returns the generated order id.
async fn write_order(conn: &mut SqliteConnection, draft: &OrderDraft) -> DbResult<String> {
    let slip = draft
        .transfer_slip
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| DbError::Internal(format!("encode transfer_slip: {e}")))?;

    let id: String = sqlx::query_scalar(
        "INSERT INTO orders (user_id, address, contact, status, transfer_slip, total_paid_cents)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         RETURNING id",
    )
    .bind(&draft.user_id)
    .bind(&draft.address)
    .bind(&draft.contact)
    .bind(draft.status.as_str())
    .bind(slip)
    .bind(draft.total_paid.cents())
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| DbError::from(e).at_step("insert order"))?;

    let mut rows = Vec::with_capacity(draft.line_items.len());
    for item in &draft.line_items {
        let snapshot = serde_json::to_string(&item.product)
            .map_err(|e| DbError::Internal(format!("encode product snapshot: {e}")))?;
        rows.push(vec![
            SqlValue::from(id.as_str()),
            SqlValue::from(item.qty),
            SqlValue::from(snapshot),
        ]);
    }

    let columns = ["order_id", "qty", "product"];
    if let Some(insert) = build_multi_insert("products_orders", &columns, rows) {
        execute_on(conn, &insert)
            .await
            .map_err(|e| e.at_step("insert products_orders"))?;
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
    use bazaar_core::types::{Category, LineItemDraft, OrderStatus, Product, TransferSlip};
    use bazaar_core::Money;
    use chrono::{NaiveDate, Utc};

    fn product(id: &str, price_cents: i64) -> Product {
        Product {
            id: id.to_string(),
            title: format!("Product {id}"),
            description: String::new(),
            price: Money::from_cents(price_cents),
            category: Category {
                id: 1,
                title: "General".to_string(),
            },
            images: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn draft(user_id: &str, address: &str, items: Vec<(i64, i64)>) -> OrderDraft {
        let line_items = items
            .into_iter()
            .enumerate()
            .map(|(i, (qty, cents))| LineItemDraft {
                qty,
                product: product(&format!("p{i}"), cents),
            })
            .collect();
        OrderDraft::new(user_id, address, "555-0100", line_items).unwrap()
    }

    async fn count_rows(db: &Database, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    async fn set_created_at(db: &Database, id: &str, ts: &str) {
        sqlx::query("UPDATE orders SET created_at = ?1 WHERE id = ?2")
            .bind(ts)
            .bind(id)
            .execute(db.pool())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_insert_then_find_one() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.orders();

        let id = repo
            .insert(&draft("u1", "1 Main St", vec![(2, 1000), (1, 500)]))
            .await
            .unwrap();
        let order = repo.find_one(&id).await.unwrap();

        assert_eq!(order.status, OrderStatus::Waiting);
        assert_eq!(order.total_paid, Money::from_cents(2500));
        assert_eq!(order.products.len(), 2);
        assert_eq!(order.products[0].qty, 2);
        assert_eq!(order.products[0].product.id, "p0");
        assert_eq!(order.products[0].product.price, Money::from_cents(1000));
        assert!(order.transfer_slip.is_none());
    }

    #[tokio::test]
    async fn test_failed_line_item_rolls_back_order() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        // qty 0 violates the products_orders CHECK constraint
        let err = db
            .orders()
            .insert(&draft("u1", "1 Main St", vec![(1, 1000), (0, 500)]))
            .await
            .unwrap_err();

        match &err {
            DbError::StepFailed { step, .. } => assert_eq!(*step, "insert products_orders"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(count_rows(&db, "orders").await, 0);
        assert_eq!(count_rows(&db, "products_orders").await, 0);
    }

    #[tokio::test]
    async fn test_empty_draft_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db
            .orders()
            .insert(&draft("u1", "1 Main St", Vec::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(_)));
        assert_eq!(count_rows(&db, "orders").await, 0);
    }

    #[tokio::test]
    async fn test_find_many_search_and_status() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.orders();
        let first = repo
            .insert(&draft("alice", "12 Oak Road", vec![(1, 100)]))
            .await
            .unwrap();
        for (user, address) in [("bob", "7 Elm Street"), ("carol", "9 Oak Lane")] {
            repo.insert(&draft(user, address, vec![(1, 100)]))
                .await
                .unwrap();
        }

        repo.update(&OrderPatch {
            order_id: first.clone(),
            status: Some(OrderStatus::Shipping),
            transfer_slip: None,
        })
        .await
        .unwrap();

        let oak = OrderFilter {
            search: "OAK".to_string(),
            ..Default::default()
        };
        assert_eq!(repo.find_many(&oak).await.unwrap().len(), 2);
        assert_eq!(repo.count(&oak).await.unwrap(), 2);

        let oak_shipping = OrderFilter {
            status: Some(OrderStatus::Shipping),
            ..oak.clone()
        };
        let found = repo.find_many(&oak_shipping).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, first);
        assert_eq!(repo.count(&oak_shipping).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_date_range_includes_whole_end_day() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.orders();
        let early = repo.insert(&draft("u1", "a", vec![(1, 100)])).await.unwrap();
        let late = repo.insert(&draft("u1", "b", vec![(1, 100)])).await.unwrap();
        let outside = repo.insert(&draft("u1", "c", vec![(1, 100)])).await.unwrap();
        set_created_at(&db, &early, "2024-03-01T00:00:00Z").await;
        set_created_at(&db, &late, "2024-03-05T23:59:59Z").await;
        set_created_at(&db, &outside, "2024-03-06T10:00:00Z").await;

        let ranged = OrderFilter {
            start_date: NaiveDate::from_ymd_opt(2024, 3, 1),
            end_date: NaiveDate::from_ymd_opt(2024, 3, 5),
            ..Default::default()
        };
        assert_eq!(repo.count(&ranged).await.unwrap(), 2);

        // A single bound is ignored.
        let open_ended = OrderFilter {
            start_date: NaiveDate::from_ymd_opt(2024, 3, 6),
            ..Default::default()
        };
        assert_eq!(repo.count(&open_ended).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_sort_and_paging() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.orders();
        let mut ids = Vec::new();
        for i in 0..7 {
            let id = repo.insert(&draft("u1", "x", vec![(1, 100)])).await.unwrap();
            set_created_at(&db, &id, &format!("2024-01-0{}T08:00:00Z", i + 1)).await;
            ids.push(id);
        }

        let filter = OrderFilter {
            sort: SortRequest::new("created_at", "asc"),
            pagination: Pagination::new(2, 5),
            ..Default::default()
        };
        let page = repo.find_page(&filter).await.unwrap();
        let got: Vec<_> = page.data.iter().map(|o| o.id.clone()).collect();
        assert_eq!(got, ids[5..].to_vec());
        assert_eq!(page.total_item, 7);
        assert_eq!(page.total_page, 2);
    }

    #[tokio::test]
    async fn test_update_partial_fields() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.orders();
        let id = repo.insert(&draft("u1", "x", vec![(1, 100)])).await.unwrap();

        let slip = TransferSlip {
            id: "slip-1".to_string(),
            filename: "slip.png".to_string(),
            url: "https://cdn.example.com/slip.png".to_string(),
            created_at: Utc::now(),
        };
        repo.update(&OrderPatch {
            order_id: id.clone(),
            status: None,
            transfer_slip: Some(slip.clone()),
        })
        .await
        .unwrap();

        let order = repo.find_one(&id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Waiting);
        let stored = order.transfer_slip.unwrap();
        assert_eq!(stored.id, slip.id);
        assert_eq!(stored.url, slip.url);

        repo.update(&OrderPatch {
            order_id: id.clone(),
            status: Some(OrderStatus::Completed),
            transfer_slip: None,
        })
        .await
        .unwrap();
        let order = repo.find_one(&id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Completed);
        assert!(order.transfer_slip.is_some());
    }

    #[tokio::test]
    async fn test_update_missing_order_and_empty_patch() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.orders();

        let missing = repo
            .update(&OrderPatch {
                order_id: "nope".to_string(),
                status: Some(OrderStatus::Canceled),
                transfer_slip: None,
            })
            .await
            .unwrap_err();
        assert!(missing.is_not_found());

        let empty = repo
            .update(&OrderPatch {
                order_id: "nope".to_string(),
                status: None,
                transfer_slip: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(empty, DbError::Domain(_)));
    }

    #[tokio::test]
    async fn test_list_reads_degrade_after_close() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.orders();
        db.close().await;

        let filter = OrderFilter::default();
        assert!(repo.find_many(&filter).await.unwrap().is_empty());
        assert_eq!(repo.count(&filter).await.unwrap(), 0);
        assert!(repo.find_one("any").await.is_err());
        assert!(repo
            .with_list_policy(ReadPolicy::Propagate)
            .find_many(&filter)
            .await
            .is_err());
    }
}
