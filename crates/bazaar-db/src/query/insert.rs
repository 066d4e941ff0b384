//! Multi-row INSERT construction for dependent rows.
//!
//! One statement, N value tuples, placeholders numbered through the buffer:
//!
//! ```text
//! INSERT INTO images (filename, url, product_id) VALUES
//!   (?1, ?2, ?3), (?4, ?5, ?6)
//! ```
//!
//! An empty row list yields `None`: a zero-tuple `VALUES` is not valid SQL,
//! so the caller skips the step instead.

use super::buffer::SqlBuffer;
use super::{BuiltQuery, SqlValue};

pub(crate) fn build_multi_insert(
    table: &str,
    columns: &[&str],
    rows: Vec<Vec<SqlValue>>,
) -> Option<BuiltQuery> {
    if rows.is_empty() || columns.is_empty() {
        return None;
    }

    let tuple = (1..=columns.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");

    let mut buf = SqlBuffer::new();
    buf.push_sql(&format!(
        "INSERT INTO {table} ({}) VALUES ",
        columns.join(", ")
    ));

    for (i, row) in rows.into_iter().enumerate() {
        debug_assert_eq!(row.len(), columns.len(), "row width mismatch");
        if i > 0 {
            buf.push_sql(", ");
        }
        buf.append(&format!("({tuple})"), row);
        buf.commit();
    }

    Some(buf.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_rows_build_nothing() {
        assert!(build_multi_insert("images", &["filename", "url"], Vec::new()).is_none());
    }

    #[test]
    fn test_tuples_numbered_consecutively() {
        let rows = vec![
            vec!["a.png".into(), "https://x/a.png".into(), "p1".into()],
            vec!["b.png".into(), "https://x/b.png".into(), "p1".into()],
        ];
        let built = build_multi_insert("images", &["filename", "url", "product_id"], rows).unwrap();
        assert_eq!(
            built.sql,
            "INSERT INTO images (filename, url, product_id) VALUES (?1, ?2, ?3), (?4, ?5, ?6)"
        );
        assert_eq!(built.values.len(), 6);
    }
}
