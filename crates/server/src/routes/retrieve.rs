use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;
use notebook_core::{RetrievedImage, RetrievedText};

#[derive(Deserialize)]
pub struct RetrieveRequest {
    pub question: String,
    #[serde(default)]
    pub source_ids: Vec<Uuid>,
}

#[derive(Serialize)]
pub struct RetrieveResponse {
    pub texts: Vec<RetrievedText>,
    pub images: Vec<RetrievedImage>,
}

/// Embed the question, search both Document types, rerank, and return the
/// combined result (§4.9, §6).
pub async fn retrieve(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RetrieveRequest>,
) -> Result<Json<RetrieveResponse>, ApiError> {
    if req.question.trim().is_empty() {
        return Err(ApiError::BadRequest("question must not be empty".to_string()));
    }

    let result = state
        .retriever
        .retrieve(&req.question, &req.source_ids)
        .await
        .map_err(ApiError::Internal)?;

    Ok(Json(RetrieveResponse { texts: result.texts, images: result.images }))
}
