//! Partial update composer for orders.
//!
//! Only populated fields reach the SET list, always in the order
//! `status`, `transfer_slip`; the id predicate is always the last
//! placeholder. `updated_at` is refreshed on every update.
//!
//! ```text
//! OrderPatch { status: Some, transfer_slip: None }
//!   ──► UPDATE orders SET status = ?1, updated_at = ... WHERE id = ?2
//! OrderPatch { status: None, transfer_slip: None }
//!   ──► ValidationError::NothingToUpdate  (never an empty SET)
//! ```

use bazaar_core::types::OrderPatch;
use bazaar_core::ValidationError;

use super::buffer::SqlBuffer;
use super::{BuiltQuery, SqlValue};
use crate::error::{DbError, DbResult};

pub fn build_order_update(patch: &OrderPatch) -> DbResult<BuiltQuery> {
    if patch.is_empty() {
        return Err(ValidationError::NothingToUpdate {
            reason: format!("order {} has neither status nor transfer_slip", patch.order_id),
        }
        .into());
    }

    let mut assignments: Vec<(&str, SqlValue)> = Vec::with_capacity(2);

    if let Some(status) = patch.status {
        assignments.push(("status", status.as_str().into()));
    }

    if let Some(slip) = &patch.transfer_slip {
        let json = serde_json::to_string(slip)
            .map_err(|e| DbError::Internal(format!("encode transfer_slip: {e}")))?;
        assignments.push(("transfer_slip", json.into()));
    }

    let mut buf = SqlBuffer::new();
    buf.push_sql("UPDATE orders SET ");

    for (i, (column, value)) in assignments.into_iter().enumerate() {
        if i > 0 {
            buf.push_sql(", ");
        }
        buf.append(&format!("{column} = ?1"), vec![value]);
        buf.commit();
    }

    buf.push_sql(", updated_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now')");
    buf.append(" WHERE id = ?1", vec![patch.order_id.as_str().into()]);
    buf.commit();

    Ok(buf.finish())
}
