use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use serde_json::Value;

use super::{AppState, error::ApiError};
use crate::header::HeaderId;

/// Response body of `POST /records/{entity}`.
#[derive(Debug, Serialize)]
pub struct RecordCreated {
    pub id: u64,
    pub entity: String,
    pub owner: i64,
    pub data: Value,
}

/// `GET /ids/{entity}`: a fresh ID for `entity`, as a decimal string.
#[tracing::instrument(level = "debug", skip_all, fields(entity = %entity))]
pub async fn next_id(
    State(state): State<AppState>,
    Path(entity): Path<String>,
) -> Result<String, ApiError> {
    let id = state.registry().generate(&entity)?;
    Ok(id.to_string())
}

/// `POST /records/{entity}`: assigns a key to a new record owned by the
/// caller named in the ID header.
#[tracing::instrument(level = "debug", skip_all, fields(entity = %entity, owner = owner))]
pub async fn create_record(
    State(state): State<AppState>,
    Path(entity): Path<String>,
    HeaderId(owner): HeaderId,
    Json(data): Json<Value>,
) -> Result<Json<RecordCreated>, ApiError> {
    let id = state.assigner().assign_id(&entity)?;
    tracing::info!(id, owner, "record created");
    Ok(Json(RecordCreated {
        id,
        entity,
        owner,
        data,
    }))
}

/// `GET /health`
pub async fn health() -> &'static str {
    "ok"
}
