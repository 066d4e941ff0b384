//! # Result Materializer
//!
//! Decodes the single JSON payload a read returns into typed aggregates.
//!
//! Containers that may legitimately be empty (`Order::products`,
//! `Product::images`) are `#[serde(default)]` on the entity, so a missing
//! or empty dependent list always decodes to `[]`. Anything else that does
//! not match the entity shape is a hard [`DbError::Decode`]; it is never
//! replaced by a default.

use serde::de::DeserializeOwned;

use crate::error::{DbError, DbResult};

/// Decodes one aggregated document.
pub fn decode_one<T: DeserializeOwned>(entity: &str, payload: &str) -> DbResult<T> {
    serde_json::from_str(payload).map_err(|e| DbError::Decode {
        entity: entity.to_string(),
        reason: e.to_string(),
    })
}

/// Decodes an array-of-documents payload. A blank payload is an empty page.
pub fn decode_many<T: DeserializeOwned>(entity: &str, payload: &str) -> DbResult<Vec<T>> {
    if payload.trim().is_empty() {
        return Ok(Vec::new());
    }
    decode_one(entity, payload)
}
