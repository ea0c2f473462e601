use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::ApiError;
use crate::jobs::models::{Job, JobConfig};
use crate::jobs::runner;
use crate::state::AppState;

#[derive(Serialize)]
pub struct IngestResponse {
    pub source_id: Uuid,
    pub message: String,
    /// True if this upload's content hash matched a prior completed ingest;
    /// no new processing was started (spec §3 Lifecycle, idempotent re-ingest).
    pub deduplicated: bool,
}

fn hex_sha256(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Accept a PDF or DOCX upload, persist it under the static root as
/// `{source_id}.{ext}`, and kick off ingestion in the background. The
/// job id doubles as the source id (§6).
pub async fn ingest(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<IngestResponse>, ApiError> {
    let mut upload: Option<(String, Vec<u8>)> = None;
    let mut config_json: Option<String> = None;

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("failed to read file: {e}")))?;
                upload = Some((filename, data.to_vec()));
            }
            "config" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("failed to read config: {e}")))?;
                config_json = Some(text);
            }
            _ => {}
        }
    }

    let (filename, data) =
        upload.ok_or_else(|| ApiError::BadRequest("no file provided".to_string()))?;
    let config: JobConfig = match config_json {
        Some(json) => serde_json::from_str(&json)
            .map_err(|e| ApiError::BadRequest(format!("invalid config JSON: {e}")))?,
        None => JobConfig::default(),
    };

    let ext = std::path::Path::new(&filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    if ext != "pdf" && ext != "docx" {
        return Err(ApiError::BadRequest(format!(
            "unsupported file type '.{ext}'; only pdf and docx are accepted"
        )));
    }

    let content_hash = hex_sha256(&data);
    if let Some(existing) = state.job_queue.find_completed_by_hash(&content_hash).await {
        return Ok(Json(IngestResponse {
            source_id: existing.id,
            message: "source already ingested".to_string(),
            deduplicated: true,
        }));
    }

    let job = Job::new(Uuid::new_v4(), filename.clone(), config, content_hash);
    let source_id = job.id;

    let stored_name = format!("{source_id}.{ext}");
    state
        .storage
        .write_bytes(&stored_name, &data)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    let uploaded_path = state.upload_dir.join(&stored_name);

    state.job_queue.add_job(job).await;

    let output_dir = state.static_dir.join(source_id.to_string());
    let orchestrator = Arc::clone(&state.orchestrator);
    let queue = state.job_queue.clone();

    tokio::spawn(async move {
        let pdf_path = if ext == "docx" {
            match notebook_core::extractor::docx_to_pdf(&uploaded_path, &output_dir).await {
                Ok(path) => path,
                Err(e) => {
                    queue.set_failed(&source_id, e.to_string()).await;
                    return;
                }
            }
        } else {
            uploaded_path
        };

        runner::run_job(source_id, pdf_path, output_dir, filename, queue, orchestrator).await;
    });

    Ok(Json(IngestResponse {
        source_id,
        message: "ingestion started".to_string(),
        deduplicated: false,
    }))
}
