//! WHERE fragments for order and product reads.
//!
//! Each applicable predicate is appended and committed in a fixed order.
//! The same functions feed both the Find and the Count construction, so
//! the two always filter identically.

use bazaar_core::filter::{OrderFilter, ProductFilter};

use super::buffer::SqlBuffer;
use super::SqlValue;

/// `%term%`, lower-cased. Matched against `lower(column)`.
fn like_pattern(term: &str) -> SqlValue {
    SqlValue::Text(format!("%{}%", term.to_lowercase()))
}

/// Orders: search, then status, then date range.
pub(crate) fn orders(buf: &mut SqlBuffer, filter: &OrderFilter) {
    let search = filter.search.trim();
    if !search.is_empty() {
        buf.append(
            "\n  AND (lower(o.user_id) LIKE ?1 OR lower(o.address) LIKE ?2 OR lower(o.contact) LIKE ?3)",
            vec![like_pattern(search), like_pattern(search), like_pattern(search)],
        );
        buf.commit();
    }

    if let Some(status) = filter.status {
        buf.append("\n  AND o.status = ?1", vec![status.as_str().into()]);
        buf.commit();
    }

    // Partial ranges are ignored. The upper bound is the day after `end`,
    // so the whole end day matches.
    if let (Some(start), Some(end)) = (filter.start_date, filter.end_date) {
        buf.append(
            "\n  AND (o.created_at BETWEEN date(?1) AND date(?2, '+1 day'))",
            vec![start.to_string().into(), end.to_string().into()],
        );
        buf.commit();
    }
}

/// Products: id equality, then search over title and description.
pub(crate) fn products(buf: &mut SqlBuffer, filter: &ProductFilter) {
    if let Some(id) = filter.id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
        buf.append("\n  AND p.id = ?1", vec![id.into()]);
        buf.commit();
    }

    let search = filter.search.trim();
    if !search.is_empty() {
        buf.append(
            "\n  AND (lower(p.title) LIKE ?1 OR lower(p.description) LIKE ?2)",
            vec![like_pattern(search), like_pattern(search)],
        );
        buf.commit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bazaar_core::types::OrderStatus;
    use chrono::NaiveDate;

    fn built_orders(filter: &OrderFilter) -> super::super::BuiltQuery {
        let mut buf = SqlBuffer::new();
        orders(&mut buf, filter);
        buf.finish()
    }

    #[test]
    fn test_no_criteria_no_predicates() {
        let built = built_orders(&OrderFilter::default());
        assert!(built.sql.is_empty());
        assert!(built.values.is_empty());
    }

    #[test]
    fn test_search_is_lowercased_and_wrapped() {
        let filter = OrderFilter {
            search: "  Bangkok ".to_string(),
            ..Default::default()
        };
        let built = built_orders(&filter);
        assert_eq!(built.values.len(), 3);
        assert!(built
            .values
            .iter()
            .all(|v| *v == SqlValue::Text("%bangkok%".to_string())));
    }

    #[test]
    fn test_fixed_order_and_numbering() {
        let filter = OrderFilter {
            search: "x".to_string(),
            status: Some(OrderStatus::Shipping),
            start_date: NaiveDate::from_ymd_opt(2026, 1, 1),
            end_date: NaiveDate::from_ymd_opt(2026, 1, 31),
            ..Default::default()
        };
        let built = built_orders(&filter);
        assert_eq!(built.placeholders(), vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(built.values[3], SqlValue::Text("shipping".to_string()));
        assert_eq!(built.values[4], SqlValue::Text("2026-01-01".to_string()));
        assert_eq!(built.values[5], SqlValue::Text("2026-01-31".to_string()));
        assert!(built.sql.contains("date(?6, '+1 day')"));
    }

    #[test]
    fn test_partial_date_range_adds_nothing() {
        let only_start = OrderFilter {
            start_date: NaiveDate::from_ymd_opt(2026, 1, 1),
            ..Default::default()
        };
        let only_end = OrderFilter {
            end_date: NaiveDate::from_ymd_opt(2026, 1, 31),
            ..Default::default()
        };
        for filter in [only_start, only_end] {
            let built = built_orders(&filter);
            assert!(!built.sql.contains("created_at"));
            assert!(built.values.is_empty());
        }
    }

    #[test]
    fn test_product_predicates() {
        let filter = ProductFilter {
            id: Some("abc".to_string()),
            search: "Shirt".to_string(),
            ..Default::default()
        };
        let mut buf = SqlBuffer::new();
        products(&mut buf, &filter);
        let built = buf.finish();
        assert_eq!(built.placeholders(), vec![1, 2, 3]);
        assert_eq!(built.values[0], SqlValue::Text("abc".to_string()));
        assert_eq!(built.values[1], SqlValue::Text("%shirt%".to_string()));
    }

    #[test]
    fn test_blank_product_id_ignored() {
        let filter = ProductFilter {
            id: Some("  ".to_string()),
            ..Default::default()
        };
        let mut buf = SqlBuffer::new();
        products(&mut buf, &filter);
        assert!(buf.finish().values.is_empty());
    }
}
