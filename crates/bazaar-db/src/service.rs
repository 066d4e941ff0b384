//! # Order Service
//!
//! Order use-cases that span more than one repository.
//!
//! ## Placing an Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  NewOrder { user_id, address, contact, products: [{ qty, product.id }] }│
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  validate_new_order ── Empty / Required / OutOfRange                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ProductLookup::find_product(id) per line                               │
//! │       │   missing ──► CoreError::ProductNotFound, nothing written       │
//! │       ▼                                                                 │
//! │  OrderDraft::new ── status = waiting, total = Σ catalog price × qty     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  OrderRepository::insert ──► find_one ──► Order                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Prices sent by the caller are ignored. The catalog is the only source.

use std::future::Future;

use bazaar_core::error::{CoreError, ValidationError};
use bazaar_core::filter::{OrderFilter, Page};
use bazaar_core::types::{
    LineItemDraft, NewOrder, Order, OrderDraft, OrderPatch, OrderStatus, Product, Role,
    TransferSlip, TransferSlipUpload, UpdateOrderRequest,
};
use bazaar_core::validation::{authorize_status_change, validate_new_order};
use chrono::Utc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::error::DbResult;
use crate::repository::order::OrderRepository;
use crate::repository::product::ProductRepository;

// =============================================================================
// Ports
// =============================================================================

/// Resolves a product id to the current catalog entry.
pub trait ProductLookup: Send + Sync {
    fn find_product(&self, id: &str) -> impl Future<Output = DbResult<Product>> + Send;
}

impl ProductLookup for ProductRepository {
    fn find_product(&self, id: &str) -> impl Future<Output = DbResult<Product>> + Send {
        self.find_one(id)
    }
}

// =============================================================================
// Service
// =============================================================================

#[derive(Debug, Clone)]
pub struct OrderService<L> {
    orders: OrderRepository,
    products: L,
}

impl<L: ProductLookup> OrderService<L> {
    pub fn new(orders: OrderRepository, products: L) -> Self {
        OrderService { orders, products }
    }

    /// Places an order from catalog snapshots.
    #[instrument(skip(self, order), fields(user_id = %order.user_id, lines = order.products.len()))]
    pub async fn place_order(&self, order: &NewOrder) -> DbResult<Order> {
        validate_new_order(order)?;

        let mut line_items = Vec::with_capacity(order.products.len());
        for line in &order.products {
            let product = match self.products.find_product(&line.product.id).await {
                Ok(product) => product,
                Err(e) if e.is_not_found() => {
                    return Err(CoreError::ProductNotFound(line.product.id.clone()).into());
                }
                Err(e) => return Err(e),
            };

            if let Some(sent) = line.product.price {
                if sent != product.price {
                    debug!(
                        product_id = %product.id,
                        sent = %sent,
                        catalog = %product.price,
                        "Ignoring caller price"
                    );
                }
            }

            line_items.push(LineItemDraft {
                qty: line.qty,
                product,
            });
        }

        let draft = OrderDraft::new(
            order.user_id.trim(),
            order.address.trim(),
            order.contact.trim(),
            line_items,
        )?;
        let id = self.orders.insert(&draft).await?;

        info!(order_id = %id, total_paid = %draft.total_paid, "Order placed");
        self.orders.find_one(&id).await
    }

    /// Applies a status change and/or a transfer slip, then returns the
    /// updated order.
    ///
    /// ## Rules
    /// - `status` must be one of waiting, shipping, completed, canceled
    /// - Customers may only cancel
    /// - A slip without an id gets a fresh one; `created_at` is always now
    #[instrument(skip(self, role, request), fields(order_id = %request.order_id, role = %role))]
    pub async fn update_order(&self, role: Role, request: &UpdateOrderRequest) -> DbResult<Order> {
        let status = request
            .status
            .as_deref()
            .map(str::parse::<OrderStatus>)
            .transpose()?;

        if let Some(status) = status {
            authorize_status_change(role, status)?;
        }

        let transfer_slip = request
            .transfer_slip
            .as_ref()
            .map(attach_slip)
            .transpose()?;

        let patch = OrderPatch {
            order_id: request.order_id.clone(),
            status,
            transfer_slip,
        };
        self.orders.update(&patch).await?;

        info!(status = ?patch.status, slip = patch.transfer_slip.is_some(), "Order updated");
        self.orders.find_one(&request.order_id).await
    }

    /// One page of orders with totals.
    pub async fn find_orders(&self, filter: &OrderFilter) -> DbResult<Page<Order>> {
        self.orders.find_page(filter).await
    }

    pub async fn find_order(&self, id: &str) -> DbResult<Order> {
        self.orders.find_one(id).await
    }
}

fn attach_slip(upload: &TransferSlipUpload) -> Result<TransferSlip, ValidationError> {
    if upload.url.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "transfer_slip.url".to_string(),
        });
    }

    let id = upload
        .id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    Ok(TransferSlip {
        id,
        filename: upload.filename.clone(),
        url: upload.url.clone(),
        created_at: Utc::now(),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::{Database, DbConfig};
    use bazaar_core::types::{Category, NewProduct, OrderLine, ProductRef};
    use bazaar_core::Money;

    async fn seeded() -> (Database, Product, Product) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut categories = vec![Category {
            id: 0,
            title: "Stationery".to_string(),
        }];
        db.categories().insert(&mut categories).await.unwrap();

        let new_product = |title: &str, cents: i64| NewProduct {
            title: title.to_string(),
            description: String::new(),
            price: Money::from_cents(cents),
            category_id: categories[0].id,
            images: Vec::new(),
        };
        let pen = new_product("Pen", 1000);
        let pad = new_product("Notepad", 500);
        let pen = db.products().insert(&pen).await.unwrap();
        let pad = db.products().insert(&pad).await.unwrap();
        (db, pen, pad)
    }

    fn line(qty: i64, id: &str, sent_cents: Option<i64>) -> OrderLine {
        OrderLine {
            qty,
            product: ProductRef {
                id: id.to_string(),
                price: sent_cents.map(Money::from_cents),
            },
        }
    }

    fn new_order(products: Vec<OrderLine>) -> NewOrder {
        NewOrder {
            user_id: "u1".to_string(),
            address: "1 Main St".to_string(),
            contact: "555-0100".to_string(),
            products,
        }
    }

    async fn order_rows(db: &Database) -> (i64, i64) {
        let orders = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(db.pool())
            .await
            .unwrap();
        let items = sqlx::query_scalar("SELECT COUNT(*) FROM products_orders")
            .fetch_one(db.pool())
            .await
            .unwrap();
        (orders, items)
    }

    #[tokio::test]
    async fn test_total_comes_from_catalog_prices() {
        let (db, pen, pad) = seeded().await;
        let service = db.order_service();

        let order = service
            .place_order(&new_order(vec![
                line(2, &pen.id, Some(1)),
                line(1, &pad.id, Some(1)),
            ]))
            .await
            .unwrap();

        assert_eq!(order.total_paid, Money::from_cents(2500));
        assert_eq!(order.status, OrderStatus::Waiting);
        assert_eq!(order.products.len(), 2);
        assert_eq!(order.products[0].product.price, Money::from_cents(1000));
        assert_eq!(order.products[0].product.title, "Pen");
    }

    #[tokio::test]
    async fn test_snapshot_survives_catalog_change() {
        let (db, pen, _) = seeded().await;
        let service = db.order_service();
        let order = service
            .place_order(&new_order(vec![line(1, &pen.id, None)]))
            .await
            .unwrap();

        sqlx::query("UPDATE products SET price_cents = 9999 WHERE id = ?1")
            .bind(&pen.id)
            .execute(db.pool())
            .await
            .unwrap();

        let reread = service.find_order(&order.id).await.unwrap();
        assert_eq!(reread.products[0].product.price, Money::from_cents(1000));
        assert_eq!(reread.total_paid, Money::from_cents(1000));
    }

    #[tokio::test]
    async fn test_missing_product_writes_nothing() {
        let (db, pen, _) = seeded().await;

        let err = db
            .order_service()
            .place_order(&new_order(vec![line(1, &pen.id, None), line(1, "gone", None)]))
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Domain(CoreError::ProductNotFound(ref id)) if id == "gone"));
        assert_eq!(order_rows(&db).await, (0, 0));
    }

    #[tokio::test]
    async fn test_empty_order_rejected() {
        let (db, _, _) = seeded().await;
        let err = db
            .order_service()
            .place_order(&new_order(Vec::new()))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::Validation(ValidationError::Empty { .. }))
        ));
        assert_eq!(order_rows(&db).await, (0, 0));
    }

    #[tokio::test]
    async fn test_customer_may_only_cancel() {
        let (db, pen, _) = seeded().await;
        let service = db.order_service();
        let order = service
            .place_order(&new_order(vec![line(1, &pen.id, None)]))
            .await
            .unwrap();

        let shipping = UpdateOrderRequest {
            order_id: order.id.clone(),
            status: Some("shipping".to_string()),
            transfer_slip: None,
        };
        let err = service
            .update_order(Role::Customer, &shipping)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::StatusChangeForbidden { .. })
        ));
        assert_eq!(
            service.find_order(&order.id).await.unwrap().status,
            OrderStatus::Waiting
        );

        let updated = service.update_order(Role::Admin, &shipping).await.unwrap();
        assert_eq!(updated.status, OrderStatus::Shipping);

        let cancel = UpdateOrderRequest {
            status: Some("canceled".to_string()),
            ..shipping
        };
        let updated = service.update_order(Role::Customer, &cancel).await.unwrap();
        assert_eq!(updated.status, OrderStatus::Canceled);
    }

    #[tokio::test]
    async fn test_slip_gets_generated_id() {
        let (db, pen, _) = seeded().await;
        let service = db.order_service();
        let order = service
            .place_order(&new_order(vec![line(1, &pen.id, None)]))
            .await
            .unwrap();

        let updated = service
            .update_order(
                Role::Customer,
                &UpdateOrderRequest {
                    order_id: order.id.clone(),
                    status: None,
                    transfer_slip: Some(TransferSlipUpload {
                        id: None,
                        filename: "slip.jpg".to_string(),
                        url: "https://cdn.example.com/slip.jpg".to_string(),
                    }),
                },
            )
            .await
            .unwrap();

        let slip = updated.transfer_slip.unwrap();
        assert_eq!(slip.filename, "slip.jpg");
        assert!(Uuid::parse_str(&slip.id).is_ok());
        assert_eq!(updated.status, OrderStatus::Waiting);
    }

    #[tokio::test]
    async fn test_unknown_status_and_empty_request() {
        let (db, pen, _) = seeded().await;
        let service = db.order_service();
        let order = service
            .place_order(&new_order(vec![line(1, &pen.id, None)]))
            .await
            .unwrap();

        let bogus = UpdateOrderRequest {
            order_id: order.id.clone(),
            status: Some("refunded".to_string()),
            transfer_slip: None,
        };
        assert!(service.update_order(Role::Admin, &bogus).await.is_err());

        let empty = UpdateOrderRequest {
            order_id: order.id,
            status: None,
            transfer_slip: None,
        };
        let err = service.update_order(Role::Admin, &empty).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::Validation(ValidationError::NothingToUpdate { .. }))
        ));
    }
}
