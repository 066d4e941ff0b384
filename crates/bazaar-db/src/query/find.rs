//! Finder query construction.
//!
//! Every read returns one JSON document assembled by SQLite itself:
//! `json_object` per entity, correlated sub-selects for dependents, and
//! `json_group_array` to fold a whole page into one array.
//!
//! ```text
//! SELECT json_group_array(json(t.doc))            ◄── one row, one payload
//! FROM (SELECT json_object(... 'products', json((SELECT json_group_array(...)
//!                                                FROM products_orders ...)))
//!              AS doc
//!       FROM orders o
//!       WHERE 1 = 1  <predicates>                 ◄── shared with Count
//!       ORDER BY ... LIMIT ?n OFFSET ?n+1) AS t
//! ```
//!
//! Subtypes do not survive a sub-select, so nested documents are re-wrapped
//! with `json(...)` to embed as JSON instead of as quoted strings.

use bazaar_core::filter::{OrderFilter, ProductFilter};

use super::buffer::SqlBuffer;
use super::{predicate, sort, BuiltQuery};

/// One order as a JSON object. Expects the order aliased as `o`.
pub(crate) const ORDER_DOCUMENT: &str = "json_object(
    'id', o.id,
    'user_id', o.user_id,
    'transfer_slip', json(o.transfer_slip),
    'products', json((
        SELECT json_group_array(json_object(
            'id', po.id,
            'qty', po.qty,
            'product', json(po.product)))
        FROM products_orders po
        WHERE po.order_id = o.id)),
    'address', o.address,
    'contact', o.contact,
    'status', o.status,
    'total_paid', o.total_paid_cents,
    'created_at', o.created_at,
    'updated_at', o.updated_at)";

/// One product as a JSON object. Expects the product aliased as `p`.
pub(crate) const PRODUCT_DOCUMENT: &str = "json_object(
    'id', p.id,
    'title', p.title,
    'description', p.description,
    'price', p.price_cents,
    'category', json((
        SELECT json_object('id', c.id, 'title', c.title)
        FROM products_categories pc
        JOIN categories c ON c.id = pc.category_id
        WHERE pc.product_id = p.id
        LIMIT 1)),
    'images', json((
        SELECT json_group_array(json_object(
            'id', i.id,
            'filename', i.filename,
            'url', i.url))
        FROM images i
        WHERE i.product_id = p.id)),
    'created_at', p.created_at,
    'updated_at', p.updated_at)";

/// Single order by id. Binds `?1`.
pub(crate) fn find_one_order_sql() -> String {
    format!("SELECT {ORDER_DOCUMENT} FROM orders o WHERE o.id = ?1")
}

/// Single product by id. Binds `?1`.
pub(crate) fn find_one_product_sql() -> String {
    format!("SELECT {PRODUCT_DOCUMENT} FROM products p WHERE p.id = ?1")
}

// =============================================================================
// Orders
// =============================================================================

/// Filtered, sorted, paged orders as one JSON array.
pub fn build_find_orders(filter: &OrderFilter) -> BuiltQuery {
    let mut buf = SqlBuffer::new();
    buf.push_sql("SELECT json_group_array(json(t.doc))\nFROM (SELECT ");
    buf.push_sql(ORDER_DOCUMENT);
    buf.push_sql(" AS doc\n  FROM orders o\n  WHERE 1 = 1");
    predicate::orders(&mut buf, filter);
    sort::orders(&mut buf, &filter.sort, filter.pagination);
    buf.push_sql(") AS t");
    buf.finish()
}

/// Number of orders matching the same predicates, ignoring paging.
pub fn build_count_orders(filter: &OrderFilter) -> BuiltQuery {
    let mut buf = SqlBuffer::new();
    buf.push_sql("SELECT COUNT(*)\n  FROM orders o\n  WHERE 1 = 1");
    predicate::orders(&mut buf, filter);
    buf.finish()
}

// =============================================================================
// Products
// =============================================================================

/// Filtered, sorted, paged products as one JSON array.
pub fn build_find_products(filter: &ProductFilter) -> BuiltQuery {
    let mut buf = SqlBuffer::new();
    buf.push_sql("SELECT json_group_array(json(t.doc))\nFROM (SELECT ");
    buf.push_sql(PRODUCT_DOCUMENT);
    buf.push_sql(" AS doc\n  FROM products p\n  WHERE 1 = 1");
    predicate::products(&mut buf, filter);
    sort::products(&mut buf, &filter.sort, filter.pagination);
    buf.push_sql(") AS t");
    buf.finish()
}

/// Number of products matching the same predicates, ignoring paging.
pub fn build_count_products(filter: &ProductFilter) -> BuiltQuery {
    let mut buf = SqlBuffer::new();
    buf.push_sql("SELECT COUNT(*)\n  FROM products p\n  WHERE 1 = 1");
    predicate::products(&mut buf, filter);
    buf.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::SqlValue;
    use bazaar_core::filter::{Pagination, SortRequest};
    use bazaar_core::types::OrderStatus;
    use chrono::NaiveDate;

    fn order_filters() -> Vec<OrderFilter> {
        let searches = ["", "alice"];
        let statuses = [None, Some(OrderStatus::Waiting)];
        let ranges = [
            (None, None),
            (NaiveDate::from_ymd_opt(2026, 1, 1), None),
            (
                NaiveDate::from_ymd_opt(2026, 1, 1),
                NaiveDate::from_ymd_opt(2026, 1, 31),
            ),
        ];

        let mut filters = Vec::new();
        for search in searches {
            for status in statuses {
                for (start_date, end_date) in ranges {
                    filters.push(OrderFilter {
                        search: search.to_string(),
                        status,
                        start_date,
                        end_date,
                        sort: SortRequest::new("created_at", "asc"),
                        pagination: Pagination::new(2, 5),
                    });
                }
            }
        }
        filters
    }

    fn assert_consistent(built: &BuiltQuery) {
        let expected: Vec<usize> = (1..=built.values.len()).collect();
        assert_eq!(built.placeholders(), expected, "sql: {}", built.sql);
    }

    #[test]
    fn test_order_placeholders_match_values() {
        for filter in order_filters() {
            assert_consistent(&build_find_orders(&filter));
            assert_consistent(&build_count_orders(&filter));
        }
    }

    #[test]
    fn test_product_placeholders_match_values() {
        for id in [None, Some("p1".to_string())] {
            for search in ["", "shirt"] {
                let filter = ProductFilter {
                    id: id.clone(),
                    search: search.to_string(),
                    sort: SortRequest::new("price", "desc"),
                    pagination: Pagination::new(1, 10),
                };
                assert_consistent(&build_find_products(&filter));
                assert_consistent(&build_count_products(&filter));
            }
        }
    }

    #[test]
    fn test_count_has_no_sort_or_paging() {
        let filter = OrderFilter {
            search: "x".to_string(),
            ..Default::default()
        };
        let count = build_count_orders(&filter);
        assert!(!count.sql.contains("ORDER BY"));
        assert!(!count.sql.contains("LIMIT"));
        assert_eq!(count.values.len(), 3);

        let find = build_find_orders(&filter);
        assert_eq!(&find.values[..3], &count.values[..]);
    }

    #[test]
    fn test_find_paging_values() {
        let filter = OrderFilter {
            pagination: Pagination::new(3, 10),
            ..Default::default()
        };
        let built = build_find_orders(&filter);
        assert_eq!(built.values, vec![SqlValue::Integer(10), SqlValue::Integer(20)]);
    }
}
