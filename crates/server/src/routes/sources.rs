use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct DeleteSourceResponse {
    pub message: String,
}

/// Remove all vector-store points for a source. Static files are left in
/// place; the orchestrator's contract does not delete them (§6).
pub async fn delete_source(
    Path(id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<DeleteSourceResponse>, ApiError> {
    state.orchestrator.delete_source(id).await?;
    Ok(Json(DeleteSourceResponse { message: format!("source {id} deleted") }))
}
