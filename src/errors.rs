use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use crate::events::EventError;
use crate::services::indexer::IndexerError;
use crate::services::metadata_store::StoreError;

/// An HTTP-facing error: a status plus the message returned to the caller.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message,
            "status": self.status.as_u16()
        }));

        (self.status, body).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::BucketNotFound(_) | StoreError::ObjectNotFound(_) => {
                AppError::not_found(err.to_string())
            }
            StoreError::BucketAlreadyExists(_) | StoreError::ObjectAlreadyExists(_) => {
                AppError::new(StatusCode::CONFLICT, err.to_string())
            }
            StoreError::Sqlx(_) => {
                tracing::error!(error = %err, "metadata store failure");
                AppError::internal("metadata store failure")
            }
        }
    }
}

impl From<EventError> for AppError {
    fn from(err: EventError) -> Self {
        AppError::new(StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
    }
}

impl From<IndexerError> for AppError {
    fn from(err: IndexerError) -> Self {
        match err {
            IndexerError::Event(err) => err.into(),
            IndexerError::Store(err) => err.into(),
        }
    }
}
