//! Defines routes for event ingestion and record lookups.
//!
//! ## Structure
//! - `POST /events`        ingest one transaction's events
//! - `GET  /buckets/{id}`  bucket record (`?include_removed=true` shows soft-deleted)
//! - `GET  /objects/{id}`  object record (same query flag)
//! - `GET  /healthz`, `GET /readyz`

use crate::{
    handlers::{
        event_handlers::ingest_events,
        health_handlers::{healthz, readyz},
        query_handlers::{get_bucket, get_object},
    },
    services::indexer::Indexer,
};
use axum::{
    Router,
    routing::{get, post},
};

/// Build the router. The [`Indexer`] is shared state for every handler.
pub fn routes() -> Router<Indexer> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/events", post(ingest_events))
        .route("/buckets/{id}", get(get_bucket))
        .route("/objects/{id}", get(get_object))
}
