//! Read-only lookups of projected records.
//!
//! Ids may be given either as the ledger's decimal id or as the stored
//! 32-byte `0x` hash. Soft-deleted records are hidden unless asked for.

use crate::{
    errors::AppError,
    events::de,
    models::{bucket::Bucket, object::Object},
    services::indexer::Indexer,
};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct LookupQuery {
    #[serde(default)]
    pub include_removed: bool,
}

/// `GET /buckets/{id}`
pub async fn get_bucket(
    State(indexer): State<Indexer>,
    Path(id): Path<String>,
    Query(query): Query<LookupQuery>,
) -> Result<Json<Bucket>, AppError> {
    let key = storage_key(&id)?;
    let bucket = indexer.store().get_bucket(&key).await?;
    if bucket.removed && !query.include_removed {
        return Err(AppError::not_found(format!("bucket `{}` was removed", key)));
    }
    Ok(Json(bucket))
}

/// `GET /objects/{id}`
pub async fn get_object(
    State(indexer): State<Indexer>,
    Path(id): Path<String>,
    Query(query): Query<LookupQuery>,
) -> Result<Json<Object>, AppError> {
    let key = storage_key(&id)?;
    let object = indexer.store().get_object(&key).await?;
    if object.removed && !query.include_removed {
        return Err(AppError::not_found(format!("object `{}` was removed", key)));
    }
    Ok(Json(object))
}

/// Normalize a path id to the stored key form.
fn storage_key(id: &str) -> Result<String, AppError> {
    let id = id.trim();
    if let Some(hex) = id.strip_prefix("0x").or_else(|| id.strip_prefix("0X")) {
        if hex.is_empty() || hex.len() > 64 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(AppError::bad_request(format!("invalid id `{}`", id)));
        }
        return Ok(format!("0x{:0>64}", hex.to_ascii_lowercase()));
    }
    de::ledger_hash(id).map_err(AppError::bad_request)
}
