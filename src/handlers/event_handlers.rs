//! Ingestion endpoint: the block feeder posts each transaction's events here.

use crate::{
    errors::AppError,
    events::{LedgerContext, RawEvent},
    services::indexer::{BlockSummary, Indexer},
};
use axum::{Json, extract::State};
use serde::Deserialize;

/// Body of `POST /events`.
#[derive(Debug, Deserialize)]
pub struct BlockRequest {
    #[serde(flatten)]
    pub context: LedgerContext,
    #[serde(default)]
    pub events: Vec<RawEvent>,
}

/// `POST /events`
///
/// Applies the events in order as one transaction. A failure rolls the whole
/// request back, so the feeder can post it again.
pub async fn ingest_events(
    State(indexer): State<Indexer>,
    Json(req): Json<BlockRequest>,
) -> Result<Json<BlockSummary>, AppError> {
    let summary = indexer.handle_block(&req.context, &req.events).await?;
    Ok(Json(summary))
}
