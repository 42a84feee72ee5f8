//! Mapping of generation failures onto HTTP responses.
//!
//! - `ClockMovedBackwards` / `ClockBeforeEpoch` / `TimestampOverflow`:
//!   `503`, the node cannot issue ordered IDs right now and another node may.
//! - Everything else: `500`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Error returned by the ID handlers.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ApiError(#[from] seqid::Error);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            seqid::Error::ClockMovedBackwards { .. }
            | seqid::Error::ClockBeforeEpoch { .. }
            | seqid::Error::TimestampOverflow { .. } => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::error!(%status, "ID generation failed: {}", self.0);
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
